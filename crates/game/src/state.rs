use engine_core::{CommandQueue, EventBus};
use net::rate_limiter::LoginAttemptLimiter;
use session::{SessionId, SessionStore};
use world::World;

use crate::deps::Deps;
use crate::events::Event;

/// An attack parsed and validated by a handler, executed by the combat
/// system in Phase 2.
#[derive(Debug, Clone, Copy)]
pub struct AttackRequest {
    pub attacker: SessionId,
    pub target_id: i32,
    pub is_melee: bool,
}

/// A skill cast awaiting Phase 2.
#[derive(Debug, Clone, Copy)]
pub struct SkillRequest {
    pub session: SessionId,
    pub skill_id: i32,
    pub target_id: i32,
}

/// Per-kind command queues drained once per tick.
#[derive(Debug, Default)]
pub struct Queues {
    pub combat: CommandQueue<AttackRequest>,
    pub skill: CommandQueue<SkillRequest>,
}

impl Queues {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Everything the tick thread owns. Handlers and systems receive
/// `&mut GameState`; the disjoint fields keep world reads and session
/// writes borrowable at the same time.
pub struct GameState {
    pub world: World,
    pub sessions: SessionStore,
    pub queues: Queues,
    pub bus: EventBus<Event>,
    pub deps: Deps,
    pub login_limiter: LoginAttemptLimiter,
    /// The tick currently being processed; set by the loop before the
    /// input drain so handlers can stamp expiry ticks.
    pub tick: u64,
}

impl GameState {
    pub fn new(deps: Deps, login_attempts_per_minute: u32) -> Self {
        Self {
            world: World::new(),
            sessions: SessionStore::new(),
            queues: Queues::new(),
            bus: EventBus::new(),
            deps,
            login_limiter: LoginAttemptLimiter::new(login_attempts_per_minute),
            tick: 0,
        }
    }
}
