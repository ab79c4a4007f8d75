//! World seeding from the static tables at boot.

use data::npc::NpcRoleTag;
use data::{DoorTable, NpcTable, SpawnTable};
use world::door::{DOOR_ACTION_CLOSE, DOOR_ACTION_OPEN};
use world::entities::{next_door_id, next_npc_id};
use world::{DoorInfo, NpcInfo, NpcRole, World};

fn role_of(tag: NpcRoleTag) -> NpcRole {
    match tag {
        NpcRoleTag::Monster => NpcRole::Monster,
        NpcRoleTag::Guard => NpcRole::Guard,
        NpcRoleTag::Merchant => NpcRole::Merchant,
    }
}

/// Instantiate every spawn entry. Multi-count spawns fan out on adjacent
/// tiles so they don't stack on one square.
pub fn spawn_npcs(world: &mut World, npcs: &NpcTable, spawns: &SpawnTable) -> usize {
    let mut spawned = 0;
    for entry in spawns.entries() {
        let Some(template) = npcs.get(entry.template_id) else {
            continue; // loader validated this; defensive against edits
        };
        for i in 0..entry.count {
            let offset = i as i32;
            let (x, y) = (entry.x + offset % 3, entry.y + offset / 3);
            world.add_npc(NpcInfo {
                id: next_npc_id(),
                template_id: template.id,
                name: template.name.clone(),
                gfx_id: template.gfx_id,
                map_id: entry.map_id,
                x,
                y,
                heading: entry.heading,
                level: template.level,
                hp: template.max_hp,
                max_hp: template.max_hp,
                mp: template.max_mp,
                max_mp: template.max_mp,
                attack: template.attack,
                defense: template.defense,
                exp: template.exp,
                role: role_of(template.role),
                dead: false,
                spawn_x: x,
                spawn_y: y,
                respawn_delay_ticks: entry.respawn_delay_ticks,
                respawn_at_tick: 0,
                wander_steps: 0,
                wander_heading: entry.heading,
                move_cooldown: 0,
                move_interval_ticks: template.move_interval_ticks,
            });
            spawned += 1;
        }
    }
    spawned
}

/// Instantiate every door spawn with its GFX geometry.
pub fn spawn_doors(world: &mut World, doors: &DoorTable) -> usize {
    let mut spawned = 0;
    for spawn in doors.spawns() {
        let Some(gfx) = doors.gfx(spawn.gfx_id) else {
            continue;
        };
        // Edge offsets are relative to the center along the door's axis.
        let center = if gfx.direction == 0 { spawn.x } else { spawn.y };
        world.add_door(DoorInfo {
            id: next_door_id(),
            door_id: spawn.id,
            gfx_id: spawn.gfx_id,
            x: spawn.x,
            y: spawn.y,
            map_id: spawn.map_id,
            max_hp: spawn.hp,
            hp: spawn.hp,
            keeper_id: spawn.keeper,
            direction: gfx.direction,
            left_edge: center + gfx.left_edge_offset,
            right_edge: center + gfx.right_edge_offset,
            open_status: if spawn.is_opening {
                DOOR_ACTION_OPEN
            } else {
                DOOR_ACTION_CLOSE
            },
            dmg_status: 0,
            dead: false,
        });
        spawned += 1;
    }
    spawned
}
