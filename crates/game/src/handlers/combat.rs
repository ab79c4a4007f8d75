use net::PacketReader;
use session::SessionId;

use crate::state::{AttackRequest, GameState};

/// Melee attack: parse and queue for Phase 2. Validation that depends on
/// world state at execution time (range, target alive) happens in the
/// combat system so every attack in a tick sees the same world.
pub fn handle_attack(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>) {
    queue_attack(state, sid, r, true);
}

pub fn handle_far_attack(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>) {
    queue_attack(state, sid, r, false);
}

fn queue_attack(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>, is_melee: bool) {
    let target_id = r.read_d();
    if target_id == 0 {
        return;
    }
    let Some(player) = state.world.player(sid) else {
        return;
    };
    if !player.can_act() {
        return;
    }
    state.queues.combat.push(AttackRequest {
        attacker: sid,
        target_id,
        is_melee,
    });
}
