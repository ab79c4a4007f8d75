use rusqlite::{params, Connection};

use crate::error::PersistError;

/// Buddy (friend) list rows: a plain domain -> rows contract.
pub struct BuddyRepo<'a> {
    conn: &'a Connection,
}

impl<'a> BuddyRepo<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn add(&self, char_id: i32, buddy_name: &str) -> Result<(), PersistError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO buddies (char_id, buddy_name) VALUES (?1, ?2)",
            params![char_id, buddy_name],
        )?;
        Ok(())
    }

    pub fn remove(&self, char_id: i32, buddy_name: &str) -> Result<bool, PersistError> {
        let rows = self.conn.execute(
            "DELETE FROM buddies WHERE char_id = ?1 AND buddy_name = ?2",
            params![char_id, buddy_name],
        )?;
        Ok(rows > 0)
    }

    pub fn list(&self, char_id: i32) -> Result<Vec<String>, PersistError> {
        let mut stmt = self
            .conn
            .prepare("SELECT buddy_name FROM buddies WHERE char_id = ?1 ORDER BY buddy_name")?;
        let rows = stmt
            .query_map([char_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Exclude (block) list rows.
pub struct ExcludeRepo<'a> {
    conn: &'a Connection,
}

impl<'a> ExcludeRepo<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn add(&self, char_id: i32, excluded_name: &str) -> Result<(), PersistError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO excludes (char_id, excluded_name) VALUES (?1, ?2)",
            params![char_id, excluded_name],
        )?;
        Ok(())
    }

    pub fn remove(&self, char_id: i32, excluded_name: &str) -> Result<bool, PersistError> {
        let rows = self.conn.execute(
            "DELETE FROM excludes WHERE char_id = ?1 AND excluded_name = ?2",
            params![char_id, excluded_name],
        )?;
        Ok(rows > 0)
    }

    pub fn list(&self, char_id: i32) -> Result<Vec<String>, PersistError> {
        let mut stmt = self.conn.prepare(
            "SELECT excluded_name FROM excludes WHERE char_id = ?1 ORDER BY excluded_name",
        )?;
        let rows = stmt
            .query_map([char_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::GameDb;

    #[test]
    fn buddy_list_round_trip() {
        let db = GameDb::open_memory().unwrap();
        let id = db.characters().create("acct", "Hero", 0).unwrap();

        db.buddies().add(id, "Friend1").unwrap();
        db.buddies().add(id, "Friend2").unwrap();
        db.buddies().add(id, "Friend1").unwrap(); // idempotent

        assert_eq!(db.buddies().list(id).unwrap(), vec!["Friend1", "Friend2"]);
        assert!(db.buddies().remove(id, "Friend1").unwrap());
        assert!(!db.buddies().remove(id, "Friend1").unwrap());
        assert_eq!(db.buddies().list(id).unwrap(), vec!["Friend2"]);
    }

    #[test]
    fn exclude_list_round_trip() {
        let db = GameDb::open_memory().unwrap();
        let id = db.characters().create("acct", "Hero", 0).unwrap();

        db.excludes().add(id, "Spammer").unwrap();
        assert_eq!(db.excludes().list(id).unwrap(), vec!["Spammer"]);
        assert!(db.excludes().remove(id, "Spammer").unwrap());
        assert!(db.excludes().list(id).unwrap().is_empty());
    }
}
