use engine_core::{Phase, System, TickInfo};
use session::SessionId;
use world::aoi::chebyshev;
use world::entities::MOVE_SPEED_HASTED;
use world::Buff;

use crate::events::Event;
use crate::packets;
use crate::state::{GameState, SkillRequest};

/// Skill id whose buff raises the movement speed tier.
const SKILL_HASTE: i32 = 26;

/// Object ids below the NPC range are character ids.
const NPC_ID_FLOOR: i32 = 200_000_000;

/// Drains the skill queue in arrival order: buffs apply to the caster,
/// positive power damages a target, negative power heals one.
pub struct SkillSystem {
    _private: (),
}

impl SkillSystem {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for SkillSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System<GameState> for SkillSystem {
    fn name(&self) -> &'static str {
        "skill"
    }

    fn phase(&self) -> Phase {
        Phase::Update
    }

    fn update(&mut self, state: &mut GameState, tick: TickInfo) {
        for request in state.queues.skill.take() {
            process_skill(state, request, tick.number);
        }
    }
}

fn process_skill(state: &mut GameState, req: SkillRequest, tick: u64) {
    let Some(skill) = state.deps.tables.skills.get(req.skill_id) else {
        return;
    };
    let (mp_cost, hp_cost, range, duration_secs, power, poly_id) = (
        skill.mp_cost,
        skill.hp_cost,
        skill.range,
        skill.duration_secs,
        skill.power,
        skill.poly_id,
    );

    let Some(caster) = state.world.player(req.session) else {
        return;
    };
    if !caster.can_act() {
        return;
    }
    if caster.mp < mp_cost || caster.hp <= hp_cost {
        state
            .sessions
            .send_to(req.session, packets::s_message_code(packets::MSG_CANNOT_NOW));
        return;
    }
    let (cx, cy, cmap, caster_char) = (caster.x, caster.y, caster.map_id, caster.char_id);

    if let Some(p) = state.world.player_mut(req.session) {
        p.mp -= mp_cost;
        p.hp -= hp_cost;
    }

    if duration_secs > 0 {
        apply_buff(state, req, duration_secs, poly_id, caster_char, (cx, cy, cmap));
    } else if power != 0 {
        apply_power(state, req, power, range, tick, caster_char, (cx, cy, cmap));
    }
}

fn apply_buff(
    state: &mut GameState,
    req: SkillRequest,
    duration_secs: i32,
    poly_id: i32,
    caster_char: i32,
    (cx, cy, cmap): (i32, i32, i16),
) {
    if let Some(p) = state.world.player_mut(req.session) {
        p.buffs.insert(
            req.skill_id,
            Buff {
                skill_id: req.skill_id,
                remaining_secs: duration_secs,
                poly_id,
            },
        );
        if req.skill_id == SKILL_HASTE {
            p.move_speed = MOVE_SPEED_HASTED;
        }
        state
            .sessions
            .send_to(req.session, packets::s_buff_icon(req.skill_id, duration_secs));
    }

    let effect = packets::s_skill_effect(caster_char, caster_char, req.skill_id, 0);
    for viewer in state.world.nearby_player_ids(cx, cy, cmap, None) {
        state.sessions.send_to(viewer, effect.clone());
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_power(
    state: &mut GameState,
    req: SkillRequest,
    power: i32,
    range: i32,
    tick: u64,
    caster_char: i32,
    (cx, cy, cmap): (i32, i32, i16),
) {
    if power < 0 {
        // Heal: the target defaults to the caster.
        let target_sid = if req.target_id == 0 || req.target_id == caster_char {
            req.session
        } else {
            match state.world.session_by_char_id(req.target_id) {
                Some(sid) => sid,
                None => return,
            }
        };
        heal_player(state, req, target_sid, -power, range, caster_char, (cx, cy, cmap));
        return;
    }

    // Offensive cast resolves like an attack against the target.
    if req.target_id >= NPC_ID_FLOOR {
        damage_npc(state, req, power, range, tick, caster_char, (cx, cy, cmap));
    } else if let Some(victim_sid) = state.world.session_by_char_id(req.target_id) {
        damage_player(state, req, victim_sid, power, range, caster_char, (cx, cy, cmap));
    }
}

#[allow(clippy::too_many_arguments)]
fn heal_player(
    state: &mut GameState,
    req: SkillRequest,
    target_sid: SessionId,
    amount: i32,
    range: i32,
    caster_char: i32,
    (cx, cy, cmap): (i32, i32, i16),
) {
    let Some(target) = state.world.player(target_sid) else {
        return;
    };
    if target.map_id != cmap || chebyshev(target.x, target.y, cx, cy) > range.max(0) {
        state
            .sessions
            .send_to(req.session, packets::s_message_code(packets::MSG_OUT_OF_RANGE));
        return;
    }
    let target_char = target.char_id;
    if let Some(p) = state.world.player_mut(target_sid) {
        p.hp = (p.hp + amount).min(p.max_hp);
        let (hp, max_hp) = (p.hp, p.max_hp);
        state.sessions.send_to(target_sid, packets::s_hp_update(hp, max_hp));
    }
    let effect = packets::s_skill_effect(caster_char, target_char, req.skill_id, amount);
    for viewer in state.world.nearby_player_ids(cx, cy, cmap, None) {
        state.sessions.send_to(viewer, effect.clone());
    }
}

#[allow(clippy::too_many_arguments)]
fn damage_npc(
    state: &mut GameState,
    req: SkillRequest,
    power: i32,
    range: i32,
    tick: u64,
    caster_char: i32,
    (cx, cy, cmap): (i32, i32, i16),
) {
    let Some(npc) = state.world.npc(req.target_id) else {
        state
            .sessions
            .send_to(req.session, packets::s_message_code(packets::MSG_TARGET_NOT_FOUND));
        return;
    };
    if npc.dead {
        return;
    }
    if npc.map_id != cmap || chebyshev(npc.x, npc.y, cx, cy) > range {
        state
            .sessions
            .send_to(req.session, packets::s_message_code(packets::MSG_OUT_OF_RANGE));
        return;
    }
    let damage = (power - npc.defense / 2).max(1);
    let (npc_id, npc_template, npc_exp, nx, ny) =
        (npc.id, npc.template_id, npc.exp, npc.x, npc.y);

    let effect = packets::s_skill_effect(caster_char, npc_id, req.skill_id, damage);
    for viewer in state.world.nearby_player_ids(cx, cy, cmap, None) {
        state.sessions.send_to(viewer, effect.clone());
    }

    let died = {
        let Some(npc) = state.world.npc_mut(npc_id) else {
            return;
        };
        npc.hp -= damage;
        npc.hp <= 0
    };
    if !died {
        return;
    }

    state.world.kill_npc(npc_id, tick);
    let death = packets::s_death(npc_id);
    for viewer in state.world.nearby_player_ids(nx, ny, cmap, None) {
        state.sessions.send_to(viewer, death.clone());
    }

    let exp_gained = (f64::from(npc_exp) * state.deps.rates.exp_rate) as i32;
    if let Some(p) = state.world.player_mut(req.session) {
        p.exp += i64::from(exp_gained);
        let (exp, level) = (p.exp, p.level);
        state.sessions.send_to(req.session, packets::s_exp(exp, level));
    }

    state.bus.publish(Event::EntityKilled {
        killer_session: req.session,
        killer_char: caster_char,
        npc_id,
        npc_template,
        exp_gained,
        map_id: cmap,
        x: nx,
        y: ny,
    });
}

#[allow(clippy::too_many_arguments)]
fn damage_player(
    state: &mut GameState,
    req: SkillRequest,
    victim_sid: SessionId,
    power: i32,
    range: i32,
    caster_char: i32,
    (cx, cy, cmap): (i32, i32, i16),
) {
    let Some(victim) = state.world.player(victim_sid) else {
        return;
    };
    if victim.dead {
        return;
    }
    if victim.map_id != cmap || chebyshev(victim.x, victim.y, cx, cy) > range {
        state
            .sessions
            .send_to(req.session, packets::s_message_code(packets::MSG_OUT_OF_RANGE));
        return;
    }
    let (victim_char, vx, vy) = (victim.char_id, victim.x, victim.y);
    let damage = power.max(1);

    let effect = packets::s_skill_effect(caster_char, victim_char, req.skill_id, damage);
    for viewer in state.world.nearby_player_ids(cx, cy, cmap, None) {
        state.sessions.send_to(viewer, effect.clone());
    }

    let died = {
        let Some(victim) = state.world.player_mut(victim_sid) else {
            return;
        };
        victim.hp = (victim.hp - damage).max(0);
        let (hp, max_hp) = (victim.hp, victim.max_hp);
        state.sessions.send_to(victim_sid, packets::s_hp_update(hp, max_hp));
        if victim.hp == 0 {
            victim.dead = true;
            true
        } else {
            false
        }
    };
    if !died {
        return;
    }

    state.world.vacate_entity(cmap, vx, vy, victim_char);
    let death = packets::s_death(victim_char);
    for viewer in state.world.nearby_player_ids(vx, vy, cmap, None) {
        state.sessions.send_to(viewer, death.clone());
    }
    state.bus.publish(Event::PlayerDied {
        char_id: victim_char,
        map_id: cmap,
        x: vx,
        y: vy,
    });
    state.bus.publish(Event::PlayerKilled {
        killer_char: caster_char,
        victim_char,
        map_id: cmap,
        x: vx,
        y: vy,
    });
}
