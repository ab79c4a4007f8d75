use rusqlite::{params, Connection};

use crate::error::PersistError;

/// One row of character_items. The rowid is the item's object id.
#[derive(Debug, Clone)]
pub struct ItemRow {
    pub id: i32,
    pub char_id: i32,
    pub item_id: i32,
    pub count: i32,
    pub enchant_lvl: i16,
    pub durability: i32,
    pub bless: bool,
    pub equipped: bool,
}

/// Repository for owned items.
pub struct ItemRepo<'a> {
    conn: &'a Connection,
}

impl<'a> ItemRepo<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new owned item; returns its object id.
    pub fn insert(
        &self,
        char_id: i32,
        item_id: i32,
        count: i32,
        enchant_lvl: i16,
        durability: i32,
        bless: bool,
    ) -> Result<i32, PersistError> {
        self.conn.execute(
            "INSERT INTO character_items (char_id, item_id, count, enchant_lvl, durability, bless)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![char_id, item_id, count, enchant_lvl, durability, bless as i32],
        )?;
        Ok(self.conn.last_insert_rowid() as i32)
    }

    pub fn load_for_char(&self, char_id: i32) -> Result<Vec<ItemRow>, PersistError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, char_id, item_id, count, enchant_lvl, durability, bless, equipped
             FROM character_items WHERE char_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([char_id], |row| {
                Ok(ItemRow {
                    id: row.get(0)?,
                    char_id: row.get(1)?,
                    item_id: row.get(2)?,
                    count: row.get(3)?,
                    enchant_lvl: row.get(4)?,
                    durability: row.get(5)?,
                    bless: row.get::<_, i32>(6)? != 0,
                    equipped: row.get::<_, i32>(7)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Move ownership, guarded by the expected current owner. Returns true
    /// when a row actually moved.
    pub fn reparent(&self, object_id: i32, from: i32, to: i32) -> Result<bool, PersistError> {
        let rows = self.conn.execute(
            "UPDATE character_items SET char_id = ?1, equipped = 0
             WHERE id = ?2 AND char_id = ?3",
            params![to, object_id, from],
        )?;
        Ok(rows > 0)
    }

    pub fn update_count(&self, object_id: i32, count: i32) -> Result<(), PersistError> {
        let rows = self.conn.execute(
            "UPDATE character_items SET count = ?1 WHERE id = ?2",
            params![count, object_id],
        )?;
        if rows == 0 {
            return Err(PersistError::ItemNotFound(object_id));
        }
        Ok(())
    }

    pub fn set_equipped(&self, object_id: i32, equipped: bool) -> Result<(), PersistError> {
        let rows = self.conn.execute(
            "UPDATE character_items SET equipped = ?1 WHERE id = ?2",
            params![equipped as i32, object_id],
        )?;
        if rows == 0 {
            return Err(PersistError::ItemNotFound(object_id));
        }
        Ok(())
    }

    pub fn delete(&self, object_id: i32) -> Result<(), PersistError> {
        let rows = self
            .conn
            .execute("DELETE FROM character_items WHERE id = ?1", [object_id])?;
        if rows == 0 {
            return Err(PersistError::ItemNotFound(object_id));
        }
        Ok(())
    }
}
