//! AOI-driven packet emission.
//!
//! Every visible transition (walk, teleport, enter, exit, spawn, respawn)
//! goes through the same diff discipline: snapshot the visible set before
//! the position change, apply it, snapshot again, then emit move packets to
//! the retained viewers, appear packets to the new ones, and remove packets
//! to the departed ones. Tile block/unblock hints ride the same diff: the
//! client learns an edge is blocked exactly when the blocking entity enters
//! its visible set.

use session::SessionId;

use crate::packets;
use crate::state::GameState;

/// Send everything around (x, y) to one session: players, NPCs, ground
/// items, doors, and summons, with collision hints for the solid ones.
/// Used on world entry and when a rejected move forces a resync.
pub fn send_surroundings(state: &mut GameState, sid: SessionId) {
    let Some(p) = state.world.player(sid) else {
        return;
    };
    let (x, y, map) = (p.x, p.y, p.map_id);

    for other_sid in state.world.nearby_player_ids(x, y, map, Some(sid)) {
        if let Some(other) = state.world.player(other_sid) {
            let put = packets::s_put_object(other);
            let block = packets::s_tile_flag(other.x, other.y, true);
            state.sessions.send_to(sid, put);
            state.sessions.send_to(sid, block);
        }
    }

    for npc_id in state.world.nearby_npc_ids(x, y, map) {
        if let Some(npc) = state.world.npc(npc_id) {
            let pack = packets::s_npc_pack(npc);
            let block = (!npc.dead).then(|| packets::s_tile_flag(npc.x, npc.y, true));
            state.sessions.send_to(sid, pack);
            if let Some(block) = block {
                state.sessions.send_to(sid, block);
            }
        }
    }

    for item_id in state.world.nearby_ground_item_ids(x, y, map) {
        if let Some(item) = state.world.ground_item(item_id) {
            let pkt = packets::s_drop_item(item);
            state.sessions.send_to(sid, pkt);
        }
    }

    for door_id in state.world.nearby_door_ids(x, y, map) {
        if let Some(door) = state.world.door(door_id) {
            let pkt = packets::s_door_pack(door);
            state.sessions.send_to(sid, pkt);
        }
    }

    for summon_id in state.world.nearby_summon_ids(x, y, map) {
        if let Some(summon) = state.world.summon(summon_id) {
            let master = state
                .world
                .player_by_char_id(summon.owner_char_id)
                .map(|m| m.name.clone())
                .unwrap_or_default();
            let pack = packets::s_summon_pack(summon, &master);
            let block = packets::s_tile_flag(summon.x, summon.y, true);
            state.sessions.send_to(sid, pack);
            state.sessions.send_to(sid, block);
        }
    }
}

/// Announce a player to every viewer already in range. The newcomer's own
/// picture comes from `send_surroundings`.
pub fn broadcast_appear(state: &mut GameState, sid: SessionId) {
    let Some(p) = state.world.player(sid) else {
        return;
    };
    let (x, y, map) = (p.x, p.y, p.map_id);
    let put = packets::s_put_object(p);
    let block = packets::s_tile_flag(x, y, true);

    for other_sid in state.world.nearby_player_ids(x, y, map, Some(sid)) {
        state.sessions.send_to(other_sid, put.clone());
        state.sessions.send_to(other_sid, block.clone());
    }
}

/// Remove a player from every viewer's picture. Call while the player is
/// still registered in the world.
pub fn broadcast_disappear(state: &mut GameState, sid: SessionId) {
    let Some(p) = state.world.player(sid) else {
        return;
    };
    let (x, y, map, char_id) = (p.x, p.y, p.map_id, p.char_id);
    let remove = packets::s_remove_object(char_id);
    let unblock = packets::s_tile_flag(x, y, false);

    for other_sid in state.world.nearby_player_ids(x, y, map, Some(sid)) {
        state.sessions.send_to(other_sid, remove.clone());
        state.sessions.send_to(other_sid, unblock.clone());
    }
}

/// Move a player to an arbitrary position (teleport, respawn): full AOI
/// diff on the player set plus a fresh surroundings picture for the mover.
pub fn teleport_player(
    state: &mut GameState,
    sid: SessionId,
    map: i16,
    x: i32,
    y: i32,
    heading: u8,
) {
    let Some(p) = state.world.player(sid) else {
        return;
    };
    let (old_x, old_y, old_map, char_id) = (p.x, p.y, p.map_id, p.char_id);

    let old_viewers = state.world.nearby_player_ids(old_x, old_y, old_map, Some(sid));
    state.world.update_position(sid, x, y, map, heading);
    let new_viewers = state.world.nearby_player_ids(x, y, map, Some(sid));

    let d = world::aoi::diff(&old_viewers, &new_viewers);

    let remove = packets::s_remove_object(char_id);
    let unblock = packets::s_tile_flag(old_x, old_y, false);
    for viewer in &d.departed {
        state.sessions.send_to(*viewer, remove.clone());
        state.sessions.send_to(*viewer, unblock.clone());
    }

    if let Some(p) = state.world.player(sid) {
        let put = packets::s_put_object(p);
        let block = packets::s_tile_flag(x, y, true);
        for viewer in &d.appeared {
            state.sessions.send_to(*viewer, put.clone());
            state.sessions.send_to(*viewer, block.clone());
        }
        // A teleport is never a step; retained viewers get remove+appear
        // rather than a walk animation.
        for viewer in &d.retained {
            state.sessions.send_to(*viewer, remove.clone());
            state.sessions.send_to(*viewer, unblock.clone());
            state.sessions.send_to(*viewer, put.clone());
            state.sessions.send_to(*viewer, block.clone());
        }

        let own = packets::s_own_char_pack(p);
        state.sessions.send_to(sid, own);
    }
    send_surroundings(state, sid);
}

/// Broadcast an NPC position change with the canonical diff. `old` is the
/// position before the move was committed.
pub fn broadcast_npc_move(state: &mut GameState, npc_id: i32, old_x: i32, old_y: i32) {
    let Some(npc) = state.world.npc(npc_id) else {
        return;
    };
    let (new_x, new_y, map, heading) = (npc.x, npc.y, npc.map_id, npc.heading);

    let old_viewers = state.world.nearby_player_ids(old_x, old_y, map, None);
    let new_viewers = state.world.nearby_player_ids(new_x, new_y, map, None);
    let d = world::aoi::diff(&old_viewers, &new_viewers);

    let mv = packets::s_move_object(npc_id, old_x, old_y, heading);
    let unblock_old = packets::s_tile_flag(old_x, old_y, false);
    let block_new = packets::s_tile_flag(new_x, new_y, true);
    for viewer in &d.retained {
        state.sessions.send_to(*viewer, mv.clone());
        state.sessions.send_to(*viewer, unblock_old.clone());
        state.sessions.send_to(*viewer, block_new.clone());
    }

    if let Some(npc) = state.world.npc(npc_id) {
        let pack = packets::s_npc_pack(npc);
        for viewer in &d.appeared {
            state.sessions.send_to(*viewer, pack.clone());
            state.sessions.send_to(*viewer, block_new.clone());
        }
    }

    let remove = packets::s_remove_object(npc_id);
    for viewer in &d.departed {
        state.sessions.send_to(*viewer, remove.clone());
        state.sessions.send_to(*viewer, unblock_old.clone());
    }
}
