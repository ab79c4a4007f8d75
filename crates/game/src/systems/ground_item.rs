use engine_core::{Phase, System, TickInfo};

use crate::packets;
use crate::state::GameState;

/// Removes expired ground items and tells nearby viewers.
pub struct GroundItemSystem;

impl System<GameState> for GroundItemSystem {
    fn name(&self) -> &'static str {
        "ground_item"
    }

    fn phase(&self) -> Phase {
        Phase::PostUpdate
    }

    fn update(&mut self, state: &mut GameState, tick: TickInfo) {
        let expired = state.world.expired_ground_items(tick.number);
        for id in expired {
            let Some(item) = state.world.remove_ground_item(id) else {
                continue;
            };
            let remove = packets::s_remove_object(id);
            for viewer in state
                .world
                .nearby_player_ids(item.x, item.y, item.map_id, None)
            {
                state.sessions.send_to(viewer, remove.clone());
            }
        }
    }
}
