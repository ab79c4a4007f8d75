use rusqlite::{params, Connection, OptionalExtension};

use crate::error::PersistError;

/// One row of the characters table.
#[derive(Debug, Clone)]
pub struct CharacterRow {
    pub id: i32,
    pub account: String,
    pub name: String,
    pub level: i32,
    pub map_id: i16,
    pub x: i32,
    pub y: i32,
    pub heading: u8,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub exp: i64,
    pub food: i32,
    pub lawful: i32,
    pub adena: i64,
}

const COLUMNS: &str =
    "id, account, name, level, map_id, x, y, heading, hp, max_hp, mp, max_mp, exp, food, lawful, adena";

fn row_to_character(row: &rusqlite::Row<'_>) -> Result<CharacterRow, rusqlite::Error> {
    Ok(CharacterRow {
        id: row.get(0)?,
        account: row.get(1)?,
        name: row.get(2)?,
        level: row.get(3)?,
        map_id: row.get(4)?,
        x: row.get(5)?,
        y: row.get(6)?,
        heading: row.get::<_, i32>(7)? as u8,
        hp: row.get(8)?,
        max_hp: row.get(9)?,
        mp: row.get(10)?,
        max_mp: row.get(11)?,
        exp: row.get(12)?,
        food: row.get(13)?,
        lawful: row.get(14)?,
        adena: row.get(15)?,
    })
}

/// Repository for the characters table.
pub struct CharacterRepo<'a> {
    conn: &'a Connection,
}

impl<'a> CharacterRepo<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a fresh character with starting stats; returns its id.
    pub fn create(&self, account: &str, name: &str, adena: i64) -> Result<i32, PersistError> {
        if self.get_by_name(name)?.is_some() {
            return Err(PersistError::CharacterNameTaken(name.to_string()));
        }
        self.conn.execute(
            "INSERT INTO characters (account, name, hp, max_hp, mp, max_mp, adena)
             VALUES (?1, ?2, 24, 24, 8, 8, ?3)",
            params![account, name, adena],
        )?;
        Ok(self.conn.last_insert_rowid() as i32)
    }

    pub fn load(&self, id: i32) -> Result<CharacterRow, PersistError> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM characters WHERE id = ?1"),
                [id],
                row_to_character,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => PersistError::CharacterNotFound(id),
                other => other.into(),
            })
    }

    /// Case-insensitive name lookup (the column collates NOCASE).
    pub fn get_by_name(&self, name: &str) -> Result<Option<CharacterRow>, PersistError> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM characters WHERE name = ?1"),
                [name],
                row_to_character,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_for_account(&self, account: &str) -> Result<Vec<CharacterRow>, PersistError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM characters WHERE account = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map([account], row_to_character)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Write back every mutable field. Used by the persistence batch and on
    /// exit.
    pub fn save(&self, c: &CharacterRow) -> Result<(), PersistError> {
        let rows = self.conn.execute(
            "UPDATE characters
             SET level = ?1, map_id = ?2, x = ?3, y = ?4, heading = ?5,
                 hp = ?6, max_hp = ?7, mp = ?8, max_mp = ?9, exp = ?10,
                 food = ?11, lawful = ?12, adena = ?13
             WHERE id = ?14",
            params![
                c.level,
                c.map_id,
                c.x,
                c.y,
                c.heading as i32,
                c.hp,
                c.max_hp,
                c.mp,
                c.max_mp,
                c.exp,
                c.food,
                c.lawful,
                c.adena,
                c.id
            ],
        )?;
        if rows == 0 {
            return Err(PersistError::CharacterNotFound(c.id));
        }
        Ok(())
    }

    pub fn adjust_adena(&self, id: i32, delta: i64) -> Result<(), PersistError> {
        let rows = self.conn.execute(
            "UPDATE characters SET adena = adena + ?1 WHERE id = ?2",
            params![delta, id],
        )?;
        if rows == 0 {
            return Err(PersistError::CharacterNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::GameDb;
    use crate::error::PersistError;

    #[test]
    fn create_and_load() {
        let db = GameDb::open_memory().unwrap();
        let id = db.characters().create("acct", "Hero", 1000).unwrap();
        let c = db.characters().load(id).unwrap();
        assert_eq!(c.name, "Hero");
        assert_eq!(c.adena, 1000);
        assert_eq!(c.level, 1);
    }

    #[test]
    fn name_is_unique_case_insensitive() {
        let db = GameDb::open_memory().unwrap();
        db.characters().create("acct", "Hero", 0).unwrap();
        let err = db.characters().create("acct2", "hero", 0).unwrap_err();
        assert!(matches!(err, PersistError::CharacterNameTaken(_)));
    }

    #[test]
    fn get_by_name_ignores_case() {
        let db = GameDb::open_memory().unwrap();
        db.characters().create("acct", "Hero", 0).unwrap();
        assert!(db.characters().get_by_name("HERO").unwrap().is_some());
        assert!(db.characters().get_by_name("nobody").unwrap().is_none());
    }

    #[test]
    fn save_round_trips_fields() {
        let db = GameDb::open_memory().unwrap();
        let id = db.characters().create("acct", "Hero", 0).unwrap();
        let mut c = db.characters().load(id).unwrap();
        c.level = 12;
        c.x = 33000;
        c.y = 32800;
        c.heading = 5;
        c.hp = 80;
        c.exp = 12345;
        db.characters().save(&c).unwrap();

        let loaded = db.characters().load(id).unwrap();
        assert_eq!(loaded.level, 12);
        assert_eq!((loaded.x, loaded.y, loaded.heading), (33000, 32800, 5));
        assert_eq!(loaded.exp, 12345);
    }

    #[test]
    fn list_for_account_ordered() {
        let db = GameDb::open_memory().unwrap();
        db.characters().create("acct", "A", 0).unwrap();
        db.characters().create("acct", "B", 0).unwrap();
        db.characters().create("other", "C", 0).unwrap();
        let list = db.characters().list_for_account("acct").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "A");
        assert_eq!(list[1].name, "B");
    }

    #[test]
    fn missing_character_is_typed_error() {
        let db = GameDb::open_memory().unwrap();
        assert!(matches!(
            db.characters().load(999),
            Err(PersistError::CharacterNotFound(999))
        ));
        assert!(matches!(
            db.characters().adjust_adena(999, 10),
            Err(PersistError::CharacterNotFound(999))
        ));
    }
}
