use engine_core::{Phase, System, TickInfo};
use rand::Rng;
use world::entities::heading_delta;
use world::NpcRole;

use crate::state::GameState;
use crate::vision;

/// Monster wander AI, one pass over all NPCs per tick.
///
/// NPCs with no player in perception range are skipped entirely (sleep
/// optimization), so a world full of idle monsters costs almost nothing.
/// Active monsters walk a few random steps at a time with an occasional
/// bias back toward their spawn anchor.
pub struct NpcAiSystem;

impl System<GameState> for NpcAiSystem {
    fn name(&self) -> &'static str {
        "npc_ai"
    }

    fn phase(&self) -> Phase {
        Phase::PostUpdate
    }

    fn update(&mut self, state: &mut GameState, _tick: TickInfo) {
        let mut rng = rand::thread_rng();

        for id in state.world.npc_ids() {
            let Some(npc) = state.world.npc(id) else {
                continue;
            };
            if npc.dead || npc.role != NpcRole::Monster {
                continue;
            }
            let (x, y, map) = (npc.x, npc.y, npc.map_id);

            // Sleep optimization: no players in perception range, no AI.
            if state.world.nearby_player_ids(x, y, map, None).is_empty() {
                continue;
            }

            let step = {
                let Some(npc) = state.world.npc_mut(id) else {
                    continue;
                };
                if npc.move_cooldown > 0 {
                    npc.move_cooldown -= 1;
                    continue;
                }

                if npc.wander_steps == 0 {
                    npc.wander_steps = rng.gen_range(1..=5);
                    npc.wander_heading = rng.gen_range(0..8);
                    // Drift home now and then so wanderers stay anchored.
                    if rng.gen_range(0..3) == 0 {
                        let (dx, dy) = (npc.spawn_x - npc.x, npc.spawn_y - npc.y);
                        if dx != 0 || dy != 0 {
                            npc.wander_heading = heading_toward(dx, dy);
                        }
                    }
                } else {
                    npc.wander_steps -= 1;
                }
                npc.move_cooldown = npc.move_interval_ticks;
                npc.wander_heading
            };

            let (dx, dy) = heading_delta(step);
            let (dest_x, dest_y) = (x + dx, y + dy);

            if state.deps.tables.maps.known_map(map)
                && !state.deps.tables.maps.is_passable(map, dest_x, dest_y)
            {
                continue;
            }
            if state.world.is_occupied(dest_x, dest_y, map, id) {
                continue;
            }

            state.world.move_npc(id, dest_x, dest_y, step);
            vision::broadcast_npc_move(state, id, x, y);
        }
    }
}

/// Closest heading for a tile delta.
fn heading_toward(dx: i32, dy: i32) -> u8 {
    match (dx.signum(), dy.signum()) {
        (0, -1) => 0,
        (1, -1) => 1,
        (1, 0) => 2,
        (1, 1) => 3,
        (0, 1) => 4,
        (-1, 1) => 5,
        (-1, 0) => 6,
        (-1, -1) => 7,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_toward_cardinals_and_diagonals() {
        assert_eq!(heading_toward(0, -5), 0); // north
        assert_eq!(heading_toward(3, 0), 2); // east
        assert_eq!(heading_toward(0, 9), 4); // south
        assert_eq!(heading_toward(-2, 0), 6); // west
        assert_eq!(heading_toward(4, 4), 3); // southeast
        assert_eq!(heading_toward(-1, -1), 7); // northwest
    }

    #[test]
    fn heading_toward_matches_delta_table() {
        for h in 0..8u8 {
            let (dx, dy) = heading_delta(h);
            assert_eq!(heading_toward(dx, dy), h);
        }
    }
}
