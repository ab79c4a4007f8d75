use std::time::{SystemTime, UNIX_EPOCH};

use net::PacketReader;
use session::SessionId;
use world::aoi::diff;
use world::entities::{heading_delta, min_move_interval_millis};

use crate::packets;
use crate::state::GameState;
use crate::vision;

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// One walk step. The client's X/Y are ignored; the server-tracked
/// position is authoritative and the blocking ingress guarantees no step
/// was dropped in between. The heading arrives XOR'd with 0x49.
pub fn handle_move(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>) {
    let _client_x = r.read_h();
    let _client_y = r.read_h();
    let heading = r.read_c() ^ 0x49;
    if heading > 7 {
        return;
    }

    let Some(player) = state.world.player(sid) else {
        return;
    };
    if player.dead || player.paralyzed || player.sleeped {
        return;
    }
    let (cur_x, cur_y, map, char_id) = (player.x, player.y, player.map_id, player.char_id);
    let speed = player.move_speed;
    let last_move = player.last_move_millis;

    // Anti-speed check: server-clock minimum interval for the speed tier,
    // 80% tolerance already folded in. A violation rejects the move and
    // resyncs the client rather than desyncing it silently.
    let now = now_millis();
    if last_move > 0 && now - last_move < min_move_interval_millis(speed) {
        reject_move(state, sid);
        return;
    }
    if let Some(p) = state.world.player_mut(sid) {
        p.last_move_millis = now;
    }

    let (dx, dy) = heading_delta(heading);
    let (dest_x, dest_y) = (cur_x + dx, cur_y + dy);

    // Static terrain first; the entity tile grid is the safety net that
    // also works when no map data is loaded for this map.
    if state.deps.tables.maps.known_map(map)
        && !state.deps.tables.maps.is_passable(map, dest_x, dest_y)
    {
        reject_move(state, sid);
        return;
    }
    if state.world.is_occupied(dest_x, dest_y, map, char_id) {
        reject_move(state, sid);
        return;
    }

    // Canonical AOI diff: snapshot, move, snapshot, partition.
    let old_players = state.world.nearby_player_ids(cur_x, cur_y, map, Some(sid));
    let old_npcs = state.world.nearby_npc_ids(cur_x, cur_y, map);
    let old_items = state.world.nearby_ground_item_ids(cur_x, cur_y, map);
    let old_doors = state.world.nearby_door_ids(cur_x, cur_y, map);
    let old_summons = state.world.nearby_summon_ids(cur_x, cur_y, map);

    state.world.update_position(sid, dest_x, dest_y, map, heading);

    let new_players = state.world.nearby_player_ids(dest_x, dest_y, map, Some(sid));
    let new_npcs = state.world.nearby_npc_ids(dest_x, dest_y, map);
    let new_items = state.world.nearby_ground_item_ids(dest_x, dest_y, map);
    let new_doors = state.world.nearby_door_ids(dest_x, dest_y, map);
    let new_summons = state.world.nearby_summon_ids(dest_x, dest_y, map);

    // Player viewers see the mover; the diff runs in both directions.
    let d = diff(&old_players, &new_players);
    let mv = packets::s_move_object(char_id, cur_x, cur_y, heading);
    let unblock_old = packets::s_tile_flag(cur_x, cur_y, false);
    let block_new = packets::s_tile_flag(dest_x, dest_y, true);
    for viewer in &d.retained {
        state.sessions.send_to(*viewer, mv.clone());
        state.sessions.send_to(*viewer, unblock_old.clone());
        state.sessions.send_to(*viewer, block_new.clone());
    }
    for viewer in &d.appeared {
        if let Some(other) = state.world.player(*viewer) {
            let put_other = packets::s_put_object(other);
            let block_other = packets::s_tile_flag(other.x, other.y, true);
            state.sessions.send_to(sid, put_other);
            state.sessions.send_to(sid, block_other);
        }
        if let Some(me) = state.world.player(sid) {
            let put_me = packets::s_put_object(me);
            state.sessions.send_to(*viewer, put_me);
            state.sessions.send_to(*viewer, block_new.clone());
        }
    }
    let remove_me = packets::s_remove_object(char_id);
    for viewer in &d.departed {
        if let Some(other) = state.world.player(*viewer) {
            let remove_other = packets::s_remove_object(other.char_id);
            let unblock_other = packets::s_tile_flag(other.x, other.y, false);
            state.sessions.send_to(sid, remove_other);
            state.sessions.send_to(sid, unblock_other);
        }
        state.sessions.send_to(*viewer, remove_me.clone());
        state.sessions.send_to(*viewer, unblock_old.clone());
    }

    // NPCs entering/leaving the mover's view.
    let d = diff(&old_npcs, &new_npcs);
    for npc_id in &d.appeared {
        if let Some(npc) = state.world.npc(*npc_id) {
            let pack = packets::s_npc_pack(npc);
            let block = (!npc.dead).then(|| packets::s_tile_flag(npc.x, npc.y, true));
            state.sessions.send_to(sid, pack);
            if let Some(block) = block {
                state.sessions.send_to(sid, block);
            }
        }
    }
    for npc_id in &d.departed {
        if let Some(npc) = state.world.npc(*npc_id) {
            let unblock = packets::s_tile_flag(npc.x, npc.y, false);
            state.sessions.send_to(sid, packets::s_remove_object(*npc_id));
            state.sessions.send_to(sid, unblock);
        }
    }

    // Ground items are not solid, so no tile flags.
    let d = diff(&old_items, &new_items);
    for item_id in &d.appeared {
        if let Some(item) = state.world.ground_item(*item_id) {
            let pkt = packets::s_drop_item(item);
            state.sessions.send_to(sid, pkt);
        }
    }
    for item_id in &d.departed {
        state.sessions.send_to(sid, packets::s_remove_object(*item_id));
    }

    let d = diff(&old_doors, &new_doors);
    for door_id in &d.appeared {
        if let Some(door) = state.world.door(*door_id) {
            let pkt = packets::s_door_pack(door);
            state.sessions.send_to(sid, pkt);
        }
    }
    for door_id in &d.departed {
        state.sessions.send_to(sid, packets::s_remove_object(*door_id));
    }

    let d = diff(&old_summons, &new_summons);
    for summon_id in &d.appeared {
        if let Some(summon) = state.world.summon(*summon_id) {
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
    for summon_id in &d.departed {
        if let Some(summon) = state.world.summon(*summon_id) {
            let unblock = packets::s_tile_flag(summon.x, summon.y, false);
            state.sessions.send_to(sid, packets::s_remove_object(*summon_id));
            state.sessions.send_to(sid, unblock);
        }
    }
}

/// Rejected move: bounce the client back to the authoritative position.
/// The bounce packet makes the client clear its nearby-object rendering,
/// so everything visible must be re-sent immediately.
fn reject_move(state: &mut GameState, sid: SessionId) {
    if let Some(player) = state.world.player(sid) {
        let own = packets::s_own_char_pack(player);
        state.sessions.send_to(sid, own);
    }
    vision::send_surroundings(state, sid);
}

/// Heading-only change: cheap, idempotent fast path mutating directly.
/// Unlike C_MOVE the heading arrives raw, no XOR.
pub fn handle_change_heading(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>) {
    let heading = r.read_c();
    if heading > 7 {
        return;
    }
    let Some(player) = state.world.player_mut(sid) else {
        return;
    };
    player.heading = heading;
    let (x, y, map, char_id) = (player.x, player.y, player.map_id, player.char_id);

    let pkt = packets::s_change_heading(char_id, heading);
    for viewer in state.world.nearby_player_ids(x, y, map, Some(sid)) {
        state.sessions.send_to(viewer, pkt.clone());
    }
}
