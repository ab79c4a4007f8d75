use net::PacketReader;
use session::SessionId;

use crate::packets;
use crate::state::{GameState, SkillRequest};

/// Skill cast: parse, check the skill exists, queue for Phase 2.
pub fn handle_use_skill(state: &mut GameState, sid: SessionId, r: &mut PacketReader<'_>) {
    let skill_id = r.read_d();
    let target_id = r.read_d();

    let Some(player) = state.world.player(sid) else {
        return;
    };
    if !player.can_act() {
        return;
    }
    if state.deps.tables.skills.get(skill_id).is_none() {
        tracing::debug!(%sid, skill_id, "unknown skill requested");
        state
            .sessions
            .send_to(sid, packets::s_message_code(packets::MSG_CANNOT_NOW));
        return;
    }
    state.queues.skill.push(SkillRequest {
        session: sid,
        skill_id,
        target_id,
    });
}
