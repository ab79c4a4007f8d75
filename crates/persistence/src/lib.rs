pub mod buff;
pub mod character;
pub mod db;
pub mod error;
pub mod item;
mod schema;
pub mod social;
pub mod wal;

pub use buff::{BuffRepo, BuffRow};
pub use character::{CharacterRepo, CharacterRow};
pub use db::{GameDb, WalSyncMode};
pub use error::PersistError;
pub use item::{ItemRepo, ItemRow};
pub use social::{BuddyRepo, ExcludeRepo};
pub use wal::{TxKind, WalEntry, WalRepo};
