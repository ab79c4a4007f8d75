pub mod command;
pub mod events;
pub mod system;

pub use command::CommandQueue;
pub use events::EventBus;
pub use system::{Phase, Scheduler, System, TickInfo, TickReport};
