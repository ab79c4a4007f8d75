use rusqlite::Connection;

use crate::buff::BuffRepo;
use crate::character::CharacterRepo;
use crate::error::PersistError;
use crate::item::ItemRepo;
use crate::schema;
use crate::social::{BuddyRepo, ExcludeRepo};
use crate::wal::WalRepo;

/// Durability mode for economic WAL commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncMode {
    /// Fsync on commit. The default; WAL rows survive power loss.
    Sync,
    /// Faster, not crash-safe. Documented operator opt-in only.
    Async,
}

impl WalSyncMode {
    pub fn parse(s: &str) -> Self {
        match s {
            "async" => Self::Async,
            _ => Self::Sync,
        }
    }
}

/// Main database handle wrapping a SQLite connection. One handle lives on
/// the tick thread; repositories borrow it per call.
pub struct GameDb {
    conn: Connection,
}

impl GameDb {
    pub fn open(path: &str, sync_mode: WalSyncMode) -> Result<Self, PersistError> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PersistError::Database(rusqlite::Error::SqliteFailure(
                        rusqlite::ffi::Error::new(1),
                        Some(format!("failed to create dir: {e}")),
                    ))
                })?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        match sync_mode {
            WalSyncMode::Sync => conn.execute_batch("PRAGMA synchronous=FULL;")?,
            WalSyncMode::Async => conn.execute_batch("PRAGMA synchronous=NORMAL;")?,
        }
        schema::create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory database for tests.
    pub fn open_memory() -> Result<Self, PersistError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::create_tables(&conn)?;
        Ok(Self { conn })
    }

    pub fn characters(&self) -> CharacterRepo<'_> {
        CharacterRepo::new(&self.conn)
    }

    pub fn items(&self) -> ItemRepo<'_> {
        ItemRepo::new(&self.conn)
    }

    pub fn buffs(&self) -> BuffRepo<'_> {
        BuffRepo::new(&self.conn)
    }

    pub fn buddies(&self) -> BuddyRepo<'_> {
        BuddyRepo::new(&self.conn)
    }

    pub fn excludes(&self) -> ExcludeRepo<'_> {
        ExcludeRepo::new(&self.conn)
    }

    pub fn wal(&mut self) -> WalRepo<'_> {
        WalRepo::new(&mut self.conn)
    }
}
