use engine_core::{Phase, System, TickInfo};

use crate::state::GameState;

/// Phase 4: flush every session's output buffer into its egress channel.
/// Batching all egress here keeps `send` free for handlers and makes
/// tick-boundary packet ordering stable. A session whose egress is full
/// (or whose writer died) is closed.
pub struct OutputSystem;

impl System<GameState> for OutputSystem {
    fn name(&self) -> &'static str {
        "output"
    }

    fn phase(&self) -> Phase {
        Phase::Output
    }

    fn update(&mut self, state: &mut GameState, _tick: TickInfo) {
        for session in state.sessions.iter_mut() {
            if session.is_closed() {
                continue;
            }
            if let Err(reason) = session.flush_output() {
                tracing::warn!(sid = %session.id, ?reason, "closing session at flush");
                session.close(reason);
            }
        }
    }
}
