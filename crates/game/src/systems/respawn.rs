use engine_core::{Phase, System, TickInfo};

use crate::packets;
use crate::state::GameState;

/// Brings dead NPCs back at their spawn anchor once the respawn delay has
/// elapsed: the corpse disappears for its viewers, the fresh NPC appears
/// for the anchor's viewers.
pub struct RespawnSystem;

impl System<GameState> for RespawnSystem {
    fn name(&self) -> &'static str {
        "respawn"
    }

    fn phase(&self) -> Phase {
        Phase::PostUpdate
    }

    fn update(&mut self, state: &mut GameState, tick: TickInfo) {
        let due: Vec<i32> = state
            .world
            .npc_ids()
            .into_iter()
            .filter(|id| {
                state
                    .world
                    .npc(*id)
                    .map(|n| n.dead && n.respawn_at_tick > 0 && n.respawn_at_tick <= tick.number)
                    .unwrap_or(false)
            })
            .collect();

        for id in due {
            let Some(npc) = state.world.npc(id) else {
                continue;
            };
            let map = npc.map_id;

            let Some((corpse, spawn)) = state.world.revive_npc(id) else {
                continue;
            };

            let remove = packets::s_remove_object(id);
            for viewer in state.world.nearby_player_ids(corpse.0, corpse.1, map, None) {
                state.sessions.send_to(viewer, remove.clone());
            }

            if let Some(npc) = state.world.npc(id) {
                let pack = packets::s_npc_pack(npc);
                let block = packets::s_tile_flag(spawn.0, spawn.1, true);
                for viewer in state.world.nearby_player_ids(spawn.0, spawn.1, map, None) {
                    state.sessions.send_to(viewer, pack.clone());
                    state.sessions.send_to(viewer, block.clone());
                }
            }
            tracing::debug!(npc_id = id, "npc respawned");
        }
    }
}
