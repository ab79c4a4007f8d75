use net::PacketReader;
use session::SessionId;
use world::aoi::chebyshev;
use world::entities::next_ground_item_id;
use world::{GroundItem, InvItem};

use crate::packets;
use crate::state::GameState;

/// Item template id of gold. Gold on the ground is a stack of this
/// template; in a character it lives on the adena counter instead.
pub const ADENA_ITEM_ID: i32 = 40308;

const PICKUP_RANGE: i32 = 3;

pub fn handle_pickup(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>) {
    let object_id = r.read_d();

    let Some(player) = state.world.player(sid) else {
        return;
    };
    if !player.can_act() {
        return;
    }
    let (px, py, map, char_id) = (player.x, player.y, player.map_id, player.char_id);

    let Some(ground) = state.world.ground_item(object_id) else {
        state
            .sessions
            .send_to(sid, packets::s_message_code(packets::MSG_TARGET_NOT_FOUND));
        return;
    };
    if ground.map_id != map || chebyshev(ground.x, ground.y, px, py) > PICKUP_RANGE {
        state
            .sessions
            .send_to(sid, packets::s_message_code(packets::MSG_OUT_OF_RANGE));
        return;
    }

    let Some(ground) = state.world.remove_ground_item(object_id) else {
        return;
    };

    // Everyone nearby (the picker included) sees the stack disappear.
    let remove = packets::s_remove_object(object_id);
    for viewer in state.world.nearby_player_ids(ground.x, ground.y, map, None) {
        state.sessions.send_to(viewer, remove.clone());
    }

    if ground.item_id == ADENA_ITEM_ID {
        if let Some(p) = state.world.player_mut(sid) {
            p.adena += i64::from(ground.count);
            let adena = p.adena;
            state.sessions.send_to(sid, packets::s_adena(adena));
        }
        return;
    }

    let row_id = match state.deps.db.items().insert(
        char_id,
        ground.item_id,
        ground.count,
        ground.enchant_lvl,
        0,
        false,
    ) {
        Ok(id) => id,
        Err(err) => {
            tracing::error!(%sid, %err, "pickup persist failed");
            state
                .sessions
                .send_to(sid, packets::s_message_code(packets::MSG_TRY_AGAIN));
            return;
        }
    };

    let item = InvItem {
        id: row_id,
        item_id: ground.item_id,
        count: ground.count,
        durability: 0,
        enchant_lvl: ground.enchant_lvl,
        bless: false,
        equipped: false,
    };
    let pkt = packets::s_inventory_add(&item);
    if let Some(p) = state.world.player_mut(sid) {
        p.inventory.push(item);
    }
    state.sessions.send_to(sid, pkt);
}

pub fn handle_drop(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>) {
    let object_id = r.read_d();
    let count = r.read_d();
    if count <= 0 {
        return;
    }

    let Some(player) = state.world.player(sid) else {
        return;
    };
    if !player.can_act() {
        return;
    }
    let (px, py, map) = (player.x, player.y, player.map_id);

    let Some(item) = player.find_item(object_id) else {
        state
            .sessions
            .send_to(sid, packets::s_message_code(packets::MSG_TARGET_NOT_FOUND));
        return;
    };
    if item.equipped || count > item.count {
        state
            .sessions
            .send_to(sid, packets::s_message_code(packets::MSG_CANNOT_NOW));
        return;
    }
    let (item_id, enchant_lvl, stack_count) = (item.item_id, item.enchant_lvl, item.count);
    let full_stack = count == stack_count;

    // Split or consume the stack in inventory and the repository first; the
    // ground item only exists once the owned row is gone.
    if full_stack {
        if let Err(err) = state.deps.db.items().delete(object_id) {
            tracing::error!(%sid, %err, "drop persist failed");
            state
                .sessions
                .send_to(sid, packets::s_message_code(packets::MSG_TRY_AGAIN));
            return;
        }
        if let Some(p) = state.world.player_mut(sid) {
            p.remove_item(object_id);
        }
        state.sessions.send_to(sid, packets::s_inventory_remove(object_id));
    } else {
        let remaining = stack_count - count;
        if let Err(err) = state.deps.db.items().update_count(object_id, remaining) {
            tracing::error!(%sid, %err, "drop persist failed");
            state
                .sessions
                .send_to(sid, packets::s_message_code(packets::MSG_TRY_AGAIN));
            return;
        }
        if let Some(p) = state.world.player_mut(sid) {
            if let Some(item) = p.find_item_mut(object_id) {
                item.count = remaining;
            }
        }
    }

    let ground = GroundItem {
        id: next_ground_item_id(),
        item_id,
        count,
        enchant_lvl,
        map_id: map,
        x: px,
        y: py,
        expires_at_tick: state.tick + state.deps.tuning.ground_item_expiry_ticks,
    };
    let pkt = packets::s_drop_item(&ground);
    state.world.add_ground_item(ground);

    for viewer in state.world.nearby_player_ids(px, py, map, None) {
        state.sessions.send_to(viewer, pkt.clone());
    }
}
