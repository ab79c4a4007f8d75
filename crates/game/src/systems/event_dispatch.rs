use engine_core::{Phase, System, TickInfo};

use crate::events::{Event, Topic};
use crate::packets;
use crate::state::GameState;
use crate::vision;

pub type Subscriber = fn(&mut GameState, &Event);

/// Swaps the event bus double-buffer and dispatches the previous tick's
/// events to subscribers in publish order. Subscribers may publish; those
/// events surface next tick.
pub struct EventDispatchSystem {
    subscribers: Vec<(Topic, Subscriber)>,
}

impl EventDispatchSystem {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// The core subscriber set: login/disconnect logging, kill credit
    /// logging, player respawn, and PK alignment penalty.
    pub fn with_default_subscribers() -> Self {
        let mut system = Self::new();
        system.subscribe(Topic::PlayerLoggedIn, on_player_logged_in);
        system.subscribe(Topic::PlayerDisconnected, on_player_disconnected);
        system.subscribe(Topic::EntityKilled, on_entity_killed);
        system.subscribe(Topic::PlayerDied, on_player_died);
        system.subscribe(Topic::PlayerKilled, on_player_killed);
        system
    }

    pub fn subscribe(&mut self, topic: Topic, subscriber: Subscriber) {
        self.subscribers.push((topic, subscriber));
    }
}

impl Default for EventDispatchSystem {
    fn default() -> Self {
        Self::with_default_subscribers()
    }
}

impl System<GameState> for EventDispatchSystem {
    fn name(&self) -> &'static str {
        "event_dispatch"
    }

    fn phase(&self) -> Phase {
        Phase::PreUpdate
    }

    fn update(&mut self, state: &mut GameState, _tick: TickInfo) {
        state.bus.swap_buffers();
        let events = state.bus.take_read();
        for event in &events {
            let topic = event.topic();
            for (subscribed, subscriber) in &self.subscribers {
                if *subscribed == topic {
                    subscriber(state, event);
                }
            }
        }
    }
}

fn on_player_logged_in(_state: &mut GameState, event: &Event) {
    if let Event::PlayerLoggedIn { char_id, name, .. } = event {
        tracing::info!(char_id, name = %name, "player logged in");
    }
}

fn on_player_disconnected(_state: &mut GameState, event: &Event) {
    if let Event::PlayerDisconnected { char_id, .. } = event {
        tracing::info!(char_id, "player disconnected");
    }
}

fn on_entity_killed(_state: &mut GameState, event: &Event) {
    if let Event::EntityKilled {
        killer_char,
        npc_template,
        exp_gained,
        ..
    } = event
    {
        // Kill-credit consumers (quests, achievements) hang off this topic.
        tracing::debug!(killer_char, npc_template, exp_gained, "npc killed");
    }
}

/// Respawn path: the dead player returns to the start of their map the
/// tick after dying, alive at partial health.
fn on_player_died(state: &mut GameState, event: &Event) {
    let Event::PlayerDied { char_id, .. } = event else {
        return;
    };
    let Some(sid) = state.world.session_by_char_id(*char_id) else {
        return; // logged out before the event surfaced
    };

    let (map, x, y) = respawn_point(state, sid);
    if let Some(p) = state.world.player_mut(sid) {
        p.dead = false;
        p.hp = (p.max_hp / 4).max(1);
        let (hp, max_hp) = (p.hp, p.max_hp);
        state.sessions.send_to(sid, packets::s_hp_update(hp, max_hp));
    }
    vision::teleport_player(state, sid, map, x, y, 0);
}

fn respawn_point(state: &GameState, sid: session::SessionId) -> (i16, i32, i32) {
    // The lowest-id teleport destination on the player's map doubles as
    // the respawn anchor; with no destination the corpse stands up where
    // it fell.
    let Some(p) = state.world.player(sid) else {
        return (0, 0, 0);
    };
    match state.deps.tables.teleports.first_on_map(p.map_id) {
        Some(entry) => (entry.map_id, entry.x, entry.y),
        None => (p.map_id, p.x, p.y),
    }
}

fn on_player_killed(state: &mut GameState, event: &Event) {
    let Event::PlayerKilled { killer_char, .. } = event else {
        return;
    };
    let Some(killer_sid) = state.world.session_by_char_id(*killer_char) else {
        return;
    };
    let penalty = (1000.0 * state.deps.rates.lawful_rate) as i32;
    if let Some(p) = state.world.player_mut(killer_sid) {
        p.lawful -= penalty;
        tracing::info!(killer = p.char_id, lawful = p.lawful, "pk alignment penalty");
    }
}
