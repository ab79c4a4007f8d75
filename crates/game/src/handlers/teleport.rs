use net::PacketReader;
use session::SessionId;

use crate::packets;
use crate::state::GameState;
use crate::vision;

/// Gatekeeper teleport to a destination from the teleport table. The fee
/// is a gold sink, not a transfer between characters, so it stays out of
/// the economic ledger and reaches the database with the next batch save.
pub fn handle_teleport(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>) {
    let teleport_id = r.read_d();

    let Some(player) = state.world.player(sid) else {
        return;
    };
    if !player.can_act() || player.pending_teleport {
        return;
    }

    let Some(entry) = state.deps.tables.teleports.get(teleport_id) else {
        state
            .sessions
            .send_to(sid, packets::s_message_code(packets::MSG_TARGET_NOT_FOUND));
        return;
    };
    let (dest_map, dest_x, dest_y, price) = (entry.map_id, entry.x, entry.y, entry.price);

    if player.adena < price {
        state
            .sessions
            .send_to(sid, packets::s_message_code(packets::MSG_NOT_ENOUGH_GOLD));
        return;
    }

    if let Some(p) = state.world.player_mut(sid) {
        p.adena -= price;
        p.pending_teleport = true;
        let adena = p.adena;
        state.sessions.send_to(sid, packets::s_adena(adena));
    }

    vision::teleport_player(state, sid, dest_map, dest_x, dest_y, 0);

    if let Some(p) = state.world.player_mut(sid) {
        p.pending_teleport = false;
    }
}
