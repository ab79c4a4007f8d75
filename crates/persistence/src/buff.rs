use rusqlite::{params, Connection};

use crate::error::PersistError;

/// One persisted buff: what remains of it when the character logs back in.
#[derive(Debug, Clone, Copy)]
pub struct BuffRow {
    pub char_id: i32,
    pub skill_id: i32,
    pub remaining_secs: i32,
    pub poly_id: i32,
}

/// Repository for character_buffs: active buffs are saved with their
/// remaining duration on exit and restored on world entry.
pub struct BuffRepo<'a> {
    conn: &'a Connection,
}

impl<'a> BuffRepo<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Replace a character's persisted buffs with the given set.
    pub fn save_all(&self, char_id: i32, buffs: &[BuffRow]) -> Result<(), PersistError> {
        self.conn
            .execute("DELETE FROM character_buffs WHERE char_id = ?1", [char_id])?;
        for b in buffs {
            self.conn.execute(
                "INSERT INTO character_buffs (char_id, skill_id, remaining_secs, poly_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![char_id, b.skill_id, b.remaining_secs, b.poly_id],
            )?;
        }
        Ok(())
    }

    pub fn load(&self, char_id: i32) -> Result<Vec<BuffRow>, PersistError> {
        let mut stmt = self.conn.prepare(
            "SELECT char_id, skill_id, remaining_secs, poly_id
             FROM character_buffs WHERE char_id = ?1 ORDER BY skill_id",
        )?;
        let rows = stmt
            .query_map([char_id], |row| {
                Ok(BuffRow {
                    char_id: row.get(0)?,
                    skill_id: row.get(1)?,
                    remaining_secs: row.get(2)?,
                    poly_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Drop persisted buffs after they have been restored in-world.
    pub fn clear(&self, char_id: i32) -> Result<(), PersistError> {
        self.conn
            .execute("DELETE FROM character_buffs WHERE char_id = ?1", [char_id])?;
        Ok(())
    }
}
