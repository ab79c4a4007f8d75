//! Phased simulation systems.
//!
//! PreUpdate: event dispatch. Update: queued command processors (combat,
//! skill). PostUpdate: periodic work (ground-item expiry, weather, party
//! refresh, NPC AI, respawn, persistence batch). Output: session flush.

pub mod combat;
pub mod event_dispatch;
pub mod ground_item;
pub mod npc_ai;
pub mod output;
pub mod party_refresh;
pub mod persist_batch;
pub mod respawn;
pub mod skill;
pub mod weather;

use engine_core::Scheduler;

use crate::state::GameState;

/// Register the full pipeline in its canonical order.
pub fn register_all(scheduler: &mut Scheduler<GameState>) {
    scheduler.register(Box::new(event_dispatch::EventDispatchSystem::with_default_subscribers()));

    scheduler.register(Box::new(combat::CombatSystem::new()));
    scheduler.register(Box::new(skill::SkillSystem::new()));

    scheduler.register(Box::new(ground_item::GroundItemSystem));
    scheduler.register(Box::new(weather::WeatherSystem::new()));
    scheduler.register(Box::new(party_refresh::PartyRefreshSystem));
    scheduler.register(Box::new(npc_ai::NpcAiSystem));
    scheduler.register(Box::new(respawn::RespawnSystem));
    scheduler.register(Box::new(persist_batch::PersistBatchSystem));

    scheduler.register(Box::new(output::OutputSystem));
}
