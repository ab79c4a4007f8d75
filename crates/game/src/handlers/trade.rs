use net::PacketReader;
use persistence::{TxKind, WalEntry};
use session::SessionId;
use world::aoi::{chebyshev, VISIBILITY_RANGE};

use crate::packets;
use crate::state::GameState;

/// Direct hand-over of gold or an item to another player.
///
/// This is the economic write path: the WAL rows go down first, and only a
/// successful commit lets the in-memory mutation proceed. Gold reaches the
/// characters table at the next persistence batch (which also marks the
/// rows processed); an item is reparented immediately, which is safe
/// because recovery's reparent is guarded by the expected owner.
pub fn handle_give(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>) {
    let target_char = r.read_d();
    let object_id = r.read_d(); // 0 = gold
    let amount = r.read_d();
    if amount <= 0 {
        return;
    }

    let Some(giver) = state.world.player(sid) else {
        return;
    };
    if !giver.can_act() {
        return;
    }
    let (gx, gy, gmap, giver_char) = (giver.x, giver.y, giver.map_id, giver.char_id);
    if target_char == giver_char {
        return;
    }

    let Some(receiver) = state.world.player_by_char_id(target_char) else {
        state
            .sessions
            .send_to(sid, packets::s_message_code(packets::MSG_TARGET_NOT_FOUND));
        return;
    };
    let receiver_sid = receiver.session_id;
    if receiver.map_id != gmap || chebyshev(receiver.x, receiver.y, gx, gy) > VISIBILITY_RANGE {
        state
            .sessions
            .send_to(sid, packets::s_message_code(packets::MSG_OUT_OF_RANGE));
        return;
    }

    if object_id == 0 {
        give_gold(state, sid, receiver_sid, giver_char, target_char, i64::from(amount));
    } else {
        give_item(state, sid, receiver_sid, giver_char, target_char, object_id, amount);
    }
}

fn give_gold(
    state: &mut GameState,
    giver_sid: SessionId,
    receiver_sid: SessionId,
    from_char: i32,
    to_char: i32,
    amount: i64,
) {
    let Some(giver) = state.world.player(giver_sid) else {
        return;
    };
    if giver.adena < amount {
        state
            .sessions
            .send_to(giver_sid, packets::s_message_code(packets::MSG_NOT_ENOUGH_GOLD));
        return;
    }

    // Ledger first. A failed commit aborts the transfer entirely.
    let entry = WalEntry::gold(TxKind::Trade, from_char, to_char, amount);
    if let Err(err) = state.deps.db.wal().write(&[entry]) {
        tracing::error!(%giver_sid, %err, "wal commit failed, aborting gold transfer");
        state
            .sessions
            .send_to(giver_sid, packets::s_message_code(packets::MSG_TRY_AGAIN));
        return;
    }

    if let Some(p) = state.world.player_mut(giver_sid) {
        p.adena -= amount;
        let adena = p.adena;
        state.sessions.send_to(giver_sid, packets::s_adena(adena));
    }
    if let Some(p) = state.world.player_mut(receiver_sid) {
        p.adena += amount;
        let adena = p.adena;
        state.sessions.send_to(receiver_sid, packets::s_adena(adena));
    }
}

fn give_item(
    state: &mut GameState,
    giver_sid: SessionId,
    receiver_sid: SessionId,
    from_char: i32,
    to_char: i32,
    object_id: i32,
    count: i32,
) {
    let Some(giver) = state.world.player(giver_sid) else {
        return;
    };
    let Some(item) = giver.find_item(object_id) else {
        state
            .sessions
            .send_to(giver_sid, packets::s_message_code(packets::MSG_TARGET_NOT_FOUND));
        return;
    };
    if item.equipped || count != item.count {
        // Partial-stack gifting is not a thing; drop and pick up instead.
        state
            .sessions
            .send_to(giver_sid, packets::s_message_code(packets::MSG_CANNOT_NOW));
        return;
    }
    let enchant_lvl = item.enchant_lvl;

    let entry = WalEntry::item(TxKind::Trade, from_char, to_char, object_id, count, enchant_lvl);
    if let Err(err) = state.deps.db.wal().write(&[entry]) {
        tracing::error!(%giver_sid, %err, "wal commit failed, aborting item transfer");
        state
            .sessions
            .send_to(giver_sid, packets::s_message_code(packets::MSG_TRY_AGAIN));
        return;
    }

    match state.deps.db.items().reparent(object_id, from_char, to_char) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(%giver_sid, object_id, "item ownership changed under transfer");
            state
                .sessions
                .send_to(giver_sid, packets::s_message_code(packets::MSG_TRY_AGAIN));
            return;
        }
        Err(err) => {
            tracing::error!(%giver_sid, %err, "item reparent failed");
            state
                .sessions
                .send_to(giver_sid, packets::s_message_code(packets::MSG_TRY_AGAIN));
            return;
        }
    }

    let moved = state
        .world
        .player_mut(giver_sid)
        .and_then(|p| p.remove_item(object_id));
    let Some(mut item) = moved else {
        return;
    };
    item.equipped = false;
    state
        .sessions
        .send_to(giver_sid, packets::s_inventory_remove(object_id));
    let add_pkt = packets::s_inventory_add(&item);
    if let Some(p) = state.world.player_mut(receiver_sid) {
        p.inventory.push(item);
    }
    state.sessions.send_to(receiver_sid, add_pkt);
}
