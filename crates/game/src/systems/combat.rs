use engine_core::{Phase, System, TickInfo};
use rand::Rng;
use world::aoi::chebyshev;

use crate::events::Event;
use crate::packets;
use crate::state::{AttackRequest, GameState};

const MELEE_RANGE: i32 = 2;
const RANGED_RANGE: i32 = 10;

/// Object ids below the NPC range are character ids.
const NPC_ID_FLOOR: i32 = 200_000_000;

/// Drains the attack queue in arrival order and applies the combat rule.
/// NPC deaths surface as EntityKilled events on the bus; player deaths as
/// PlayerDied (and PlayerKilled for PK).
pub struct CombatSystem {
    _private: (),
}

impl CombatSystem {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for CombatSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System<GameState> for CombatSystem {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn phase(&self) -> Phase {
        Phase::Update
    }

    fn update(&mut self, state: &mut GameState, tick: TickInfo) {
        for request in state.queues.combat.take() {
            process_attack(state, request, tick.number);
        }
    }
}

fn process_attack(state: &mut GameState, req: AttackRequest, tick: u64) {
    let Some(attacker) = state.world.player(req.attacker) else {
        return;
    };
    if !attacker.can_act() {
        return;
    }
    let (ax, ay, amap) = (attacker.x, attacker.y, attacker.map_id);
    let (attacker_char, attacker_level, heading) =
        (attacker.char_id, attacker.level, attacker.heading);
    let range = if req.is_melee { MELEE_RANGE } else { RANGED_RANGE };

    if req.target_id >= NPC_ID_FLOOR {
        attack_npc(
            state,
            req,
            tick,
            (ax, ay, amap),
            attacker_char,
            attacker_level,
            heading,
            range,
        );
    } else {
        attack_player(state, req, (ax, ay, amap), attacker_char, attacker_level, heading, range);
    }
}

fn roll_damage(level: i32, defense: i32) -> i32 {
    let swing = rand::thread_rng().gen_range(0..5);
    (level + swing - defense).max(1)
}

#[allow(clippy::too_many_arguments)]
fn attack_npc(
    state: &mut GameState,
    req: AttackRequest,
    tick: u64,
    (ax, ay, amap): (i32, i32, i16),
    attacker_char: i32,
    attacker_level: i32,
    heading: u8,
    range: i32,
) {
    let Some(npc) = state.world.npc(req.target_id) else {
        state
            .sessions
            .send_to(req.attacker, packets::s_message_code(packets::MSG_TARGET_NOT_FOUND));
        return;
    };
    if npc.dead {
        return;
    }
    if npc.map_id != amap || chebyshev(npc.x, npc.y, ax, ay) > range {
        state
            .sessions
            .send_to(req.attacker, packets::s_message_code(packets::MSG_OUT_OF_RANGE));
        return;
    }

    let damage = roll_damage(attacker_level, npc.defense);
    let (npc_id, npc_template, npc_exp, nx, ny) =
        (npc.id, npc.template_id, npc.exp, npc.x, npc.y);

    let swing = packets::s_attack(attacker_char, npc_id, damage, heading);
    for viewer in state.world.nearby_player_ids(ax, ay, amap, None) {
        state.sessions.send_to(viewer, swing.clone());
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
    for viewer in state.world.nearby_player_ids(nx, ny, amap, None) {
        state.sessions.send_to(viewer, death.clone());
    }

    let exp_gained = (f64::from(npc_exp) * state.deps.rates.exp_rate) as i32;
    if let Some(p) = state.world.player_mut(req.attacker) {
        p.exp += i64::from(exp_gained);
        let (exp, level) = (p.exp, p.level);
        state.sessions.send_to(req.attacker, packets::s_exp(exp, level));
    }

    state.bus.publish(Event::EntityKilled {
        killer_session: req.attacker,
        killer_char: attacker_char,
        npc_id,
        npc_template,
        exp_gained,
        map_id: amap,
        x: nx,
        y: ny,
    });
}

fn attack_player(
    state: &mut GameState,
    req: AttackRequest,
    (ax, ay, amap): (i32, i32, i16),
    attacker_char: i32,
    attacker_level: i32,
    heading: u8,
    range: i32,
) {
    let Some(victim_sid) = state.world.session_by_char_id(req.target_id) else {
        state
            .sessions
            .send_to(req.attacker, packets::s_message_code(packets::MSG_TARGET_NOT_FOUND));
        return;
    };
    let Some(victim) = state.world.player(victim_sid) else {
        return;
    };
    if victim.dead {
        return;
    }
    if victim.map_id != amap || chebyshev(victim.x, victim.y, ax, ay) > range {
        state
            .sessions
            .send_to(req.attacker, packets::s_message_code(packets::MSG_OUT_OF_RANGE));
        return;
    }
    let (victim_char, vx, vy) = (victim.char_id, victim.x, victim.y);

    let damage = roll_damage(attacker_level, victim.level / 2);
    let swing = packets::s_attack(attacker_char, victim_char, damage, heading);
    for viewer in state.world.nearby_player_ids(ax, ay, amap, None) {
        state.sessions.send_to(viewer, swing.clone());
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

    // The corpse stops blocking its tile but stays perceivable.
    state.world.vacate_entity(amap, vx, vy, victim_char);
    let death = packets::s_death(victim_char);
    for viewer in state.world.nearby_player_ids(vx, vy, amap, None) {
        state.sessions.send_to(viewer, death.clone());
    }

    state.bus.publish(Event::PlayerDied {
        char_id: victim_char,
        map_id: amap,
        x: vx,
        y: vy,
    });
    state.bus.publish(Event::PlayerKilled {
        killer_char: attacker_char,
        victim_char,
        map_id: amap,
        x: vx,
        y: vy,
    });
}
