use engine_core::{Phase, System, TickInfo};

use crate::persist_ops;
use crate::state::GameState;

/// Periodic durability point: saves every online character, then marks the
/// economic WAL processed.
///
/// Order matters: characters (including in-memory adena moved by WAL'd
/// transfers) must hit the database before the WAL rows are retired, or a
/// crash between the two would lose the transfers.
pub struct PersistBatchSystem;

impl System<GameState> for PersistBatchSystem {
    fn name(&self) -> &'static str {
        "persist_batch"
    }

    fn phase(&self) -> Phase {
        Phase::PostUpdate
    }

    fn update(&mut self, state: &mut GameState, tick: TickInfo) {
        let interval = state.deps.tuning.batch_interval_ticks;
        if interval == 0 || tick.number % interval != 0 {
            return;
        }

        let mut saved = 0u32;
        let mut failed = 0u32;
        let sids = state.world.player_sessions();
        for sid in sids {
            let Some(player) = state.world.player(sid) else {
                continue;
            };
            match persist_ops::save_player(&state.deps.db, player) {
                Ok(()) => saved += 1,
                Err(err) => {
                    failed += 1;
                    tracing::error!(%sid, %err, "batch save failed");
                }
            }
        }

        match state.deps.db.wal().mark_processed() {
            Ok(retired) => {
                tracing::info!(tick = tick.number, saved, failed, wal_retired = retired, "persistence batch");
            }
            Err(err) => tracing::error!(%err, "wal mark_processed failed"),
        }
    }
}
