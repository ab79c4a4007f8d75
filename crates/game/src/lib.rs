pub mod bootstrap;
pub mod deps;
pub mod events;
pub mod game_loop;
pub mod handlers;
pub mod packets;
pub mod persist_ops;
pub mod state;
pub mod systems;
pub mod vision;

pub use deps::{Deps, Rates, Tables, Tuning};
pub use events::{Event, Topic};
pub use game_loop::GameLoop;
pub use state::{AttackRequest, GameState, Queues, SkillRequest};
