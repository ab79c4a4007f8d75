use session::SessionId;

/// Cross-system notifications. Published during tick N, dispatched at
/// PreUpdate of tick N+1. Each carries enough context that subscribers
/// never have to inspect current world state to act on it.
#[derive(Debug, Clone)]
pub enum Event {
    PlayerLoggedIn {
        session_id: SessionId,
        char_id: i32,
        name: String,
    },
    PlayerDisconnected {
        session_id: SessionId,
        char_id: i32,
    },
    /// An NPC died. Subscribers: kill-credit consumers (quests,
    /// achievements) and operator logging.
    EntityKilled {
        killer_session: SessionId,
        killer_char: i32,
        npc_id: i32,
        npc_template: i32,
        exp_gained: i32,
        map_id: i16,
        x: i32,
        y: i32,
    },
    /// A player died, PvE or PvP. Drives the respawn path.
    PlayerDied {
        char_id: i32,
        map_id: i16,
        x: i32,
        y: i32,
    },
    /// A player was killed by another player; emitted in addition to
    /// PlayerDied for PK-specific logic.
    PlayerKilled {
        killer_char: i32,
        victim_char: i32,
        map_id: i16,
        x: i32,
        y: i32,
    },
}

/// Subscription key: one topic per event variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    PlayerLoggedIn,
    PlayerDisconnected,
    EntityKilled,
    PlayerDied,
    PlayerKilled,
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::PlayerLoggedIn { .. } => Topic::PlayerLoggedIn,
            Event::PlayerDisconnected { .. } => Topic::PlayerDisconnected,
            Event::EntityKilled { .. } => Topic::EntityKilled,
            Event::PlayerDied { .. } => Topic::PlayerDied,
            Event::PlayerKilled { .. } => Topic::PlayerKilled,
        }
    }
}
