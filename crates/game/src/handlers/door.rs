use net::PacketReader;
use session::SessionId;
use world::aoi::chebyshev;

use crate::packets;
use crate::state::GameState;

const DOOR_USE_RANGE: i32 = 3;

/// Toggle a door. Keeper-guarded doors only obey their keeper's clan; with
/// clan politics out of this layer, a non-zero keeper refuses everyone.
pub fn handle_open_door(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>) {
    let door_id = r.read_d();

    let Some(player) = state.world.player(sid) else {
        return;
    };
    if !player.can_act() {
        return;
    }
    let (px, py, map) = (player.x, player.y, player.map_id);

    let Some(door) = state.world.door(door_id) else {
        state
            .sessions
            .send_to(sid, packets::s_message_code(packets::MSG_TARGET_NOT_FOUND));
        return;
    };
    if door.map_id != map || chebyshev(door.x, door.y, px, py) > DOOR_USE_RANGE {
        state
            .sessions
            .send_to(sid, packets::s_message_code(packets::MSG_OUT_OF_RANGE));
        return;
    }
    if door.dead {
        return;
    }
    if door.keeper_id != 0 {
        state
            .sessions
            .send_to(sid, packets::s_message_code(packets::MSG_DOOR_LOCKED));
        return;
    }

    let open = !door.is_passable();
    if !state.world.set_door_open(door_id, open) {
        return;
    }

    let Some(door) = state.world.door(door_id) else {
        return;
    };
    let pkt = packets::s_door_pack(door);
    let (dx, dy) = (door.x, door.y);
    for viewer in state.world.nearby_player_ids(dx, dy, map, None) {
        state.sessions.send_to(viewer, pkt.clone());
    }
}
