use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use bytes::Bytes;
use engine_core::Scheduler;
use net::channels::{IngressRx, NetToTick};
use net::Registry;
use session::{CloseReason, Session, SessionId};
use tokio::sync::watch;

use crate::events::Event;
use crate::packets;
use crate::persist_ops;
use crate::state::GameState;
use crate::vision;

/// The tick thread: owns all world state and runs the fixed-rate loop.
///
/// Per tick: (0) drain the ingress channel and dispatch up to the per-tick
/// cap of packets per session, (1)-(4) run the phased systems, then sleep
/// out the remainder of the period. An overrun starts the next tick
/// immediately; there is no catch-up beyond that.
pub struct GameLoop {
    pub state: GameState,
    pub scheduler: Scheduler<GameState>,
    registry: Registry<GameState>,
    ingress: IngressRx,
    /// Per-session queues of undispatched packets; overflow past the
    /// per-tick cap carries over to the next tick.
    pending: BTreeMap<SessionId, VecDeque<Bytes>>,
    shutdown: watch::Receiver<bool>,
    max_packets_per_tick: usize,
}

impl GameLoop {
    pub fn new(
        state: GameState,
        scheduler: Scheduler<GameState>,
        registry: Registry<GameState>,
        ingress: IngressRx,
        shutdown: watch::Receiver<bool>,
        max_packets_per_tick: usize,
    ) -> Self {
        Self {
            state,
            scheduler,
            registry,
            ingress,
            pending: BTreeMap::new(),
            shutdown,
            max_packets_per_tick: max_packets_per_tick.max(1),
        }
    }

    pub fn run(mut self) {
        let period = self.scheduler.period();
        tracing::info!(period_ms = period.as_millis() as u64, "tick loop running");

        loop {
            if *self.shutdown.borrow() {
                break;
            }
            let tick_start = Instant::now();
            self.state.tick = self.scheduler.current_tick() + 1;

            self.drain_network();

            // A panicking tick is logged and the loop re-enters on the next
            // period; I/O tasks and world state outlive it.
            let run = AssertUnwindSafe(|| self.scheduler.run_tick(&mut self.state));
            if std::panic::catch_unwind(run).is_err() {
                tracing::error!(tick = self.state.tick, "tick panicked");
            }

            let elapsed = tick_start.elapsed();
            if elapsed < period {
                std::thread::sleep(period - elapsed);
            }
        }

        self.shutdown_world();
    }

    /// Phase 0: pull everything the network produced, then dispatch up to
    /// `max_packets_per_tick` packets per session in session-id order.
    fn drain_network(&mut self) {
        loop {
            match self.ingress.try_recv() {
                Ok(NetToTick::Connected {
                    session_id,
                    peer,
                    egress,
                    close,
                }) => {
                    tracing::debug!(%session_id, %peer, "session registered");
                    self.state
                        .sessions
                        .add(Session::new(session_id, peer, egress, close));
                }
                Ok(NetToTick::Packet {
                    session_id,
                    payload,
                }) => {
                    self.pending.entry(session_id).or_default().push_back(payload);
                }
                Ok(NetToTick::Disconnected { session_id }) => {
                    self.teardown_session(session_id);
                }
                Err(_) => break,
            }
        }

        let sids: Vec<SessionId> = self.pending.keys().copied().collect();
        for sid in sids {
            let mut budget = self.max_packets_per_tick;
            while budget > 0 {
                let Some(payload) = self.pending.get_mut(&sid).and_then(VecDeque::pop_front)
                else {
                    break;
                };
                let Some(session_state) = self.state.sessions.get(sid).map(|s| s.state()) else {
                    // Session already torn down; drop its backlog.
                    self.pending.remove(&sid);
                    break;
                };
                self.registry
                    .dispatch(&mut self.state, sid, session_state, &payload);
                budget -= 1;
            }
            if self.pending.get(&sid).is_some_and(VecDeque::is_empty) {
                self.pending.remove(&sid);
            }
        }
    }

    /// Final teardown once the reader task reports the connection gone:
    /// persist and remove the bound character, announce the departure, and
    /// drop the session.
    fn teardown_session(&mut self, sid: SessionId) {
        self.pending.remove(&sid);

        let char_id = self.state.sessions.get(sid).and_then(|s| s.char_id());
        if let Some(char_id) = char_id {
            vision::broadcast_disappear(&mut self.state, sid);
            if let Some(player) = self.state.world.remove_player(sid) {
                if let Err(err) = persist_ops::save_player(&self.state.deps.db, &player) {
                    tracing::error!(%sid, %err, "save on disconnect failed");
                }
            }
            self.state.bus.publish(Event::PlayerDisconnected {
                session_id: sid,
                char_id,
            });
        }

        if let Some(mut session) = self.state.sessions.remove(sid) {
            session.close(CloseReason::ReadError);
            tracing::info!(%sid, reason = ?session.close_reason(), "session removed");
        }
    }

    /// Global shutdown: notify and close every session, run one final save
    /// pass, and retire the WAL backlog.
    fn shutdown_world(&mut self) {
        tracing::info!("tick loop stopping, closing sessions");

        let sids = self.state.sessions.ids();
        for sid in sids {
            if let Some(session) = self.state.sessions.get_mut(sid) {
                session.send(packets::s_message_code(packets::MSG_CANNOT_NOW));
                let _ = session.flush_output();
                session.close(CloseReason::ServerShutdown);
            }
        }

        let mut saved = 0u32;
        for sid in self.state.world.player_sessions() {
            if let Some(player) = self.state.world.player(sid) {
                match persist_ops::save_player(&self.state.deps.db, player) {
                    Ok(()) => saved += 1,
                    Err(err) => tracing::error!(%sid, %err, "final save failed"),
                }
            }
        }
        match self.state.deps.db.wal().mark_processed() {
            Ok(retired) => tracing::info!(saved, wal_retired = retired, "final persistence pass"),
            Err(err) => tracing::error!(%err, "final wal retirement failed"),
        }
    }
}
