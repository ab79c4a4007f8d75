use rusqlite::{params, Connection, OptionalExtension};

use crate::error::PersistError;

/// Transaction kind tag. Unrecognized tags are accepted and replayed as
/// generic transfers with the same guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxKind {
    Trade,
    Shop,
    Auction,
    Other(String),
}

impl TxKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Trade => "trade",
            Self::Shop => "shop",
            Self::Auction => "auction",
            Self::Other(tag) => tag,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "trade" => Self::Trade,
            "shop" => Self::Shop,
            "auction" => Self::Auction,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One economic mutation, written before the in-memory effect is considered
/// durable. A logical transaction may fan out into multiple rows, one per
/// side of a transfer.
#[derive(Debug, Clone)]
pub struct WalEntry {
    pub kind: TxKind,
    pub from_char: i32,
    pub to_char: i32,
    /// Item object id being reparented; 0 = gold-only entry.
    pub item_id: i32,
    pub count: i32,
    pub enchant_lvl: i16,
    pub gold_amount: i64,
}

impl WalEntry {
    pub fn gold(kind: TxKind, from_char: i32, to_char: i32, amount: i64) -> Self {
        Self {
            kind,
            from_char,
            to_char,
            item_id: 0,
            count: 0,
            enchant_lvl: 0,
            gold_amount: amount,
        }
    }

    pub fn item(
        kind: TxKind,
        from_char: i32,
        to_char: i32,
        item_id: i32,
        count: i32,
        enchant_lvl: i16,
    ) -> Self {
        Self {
            kind,
            from_char,
            to_char,
            item_id,
            count,
            enchant_lvl,
            gold_amount: 0,
        }
    }
}

/// Append-only ledger of committed economic transactions.
pub struct WalRepo<'a> {
    conn: &'a mut Connection,
}

impl<'a> WalRepo<'a> {
    pub(crate) fn new(conn: &'a mut Connection) -> Self {
        Self { conn }
    }

    /// Insert every entry in one transaction. On error nothing is written
    /// and the caller must abort the game-side mutation.
    pub fn write(&mut self, entries: &[WalEntry]) -> Result<(), PersistError> {
        let tx = self.conn.transaction()?;
        for e in entries {
            tx.execute(
                "INSERT INTO economic_wal
                     (tx_type, from_char, to_char, item_id, count, enchant_lvl, gold_amount)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    e.kind.as_str(),
                    e.from_char,
                    e.to_char,
                    e.item_id,
                    e.count,
                    e.enchant_lvl,
                    e.gold_amount
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Flip the processed flag on every unprocessed row in one statement.
    /// Invoked by the persistence batch.
    pub fn mark_processed(&mut self) -> Result<usize, PersistError> {
        let n = self
            .conn
            .execute("UPDATE economic_wal SET processed = 1 WHERE processed = 0", [])?;
        Ok(n)
    }

    pub fn unprocessed_count(&mut self) -> Result<i64, PersistError> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM economic_wal WHERE processed = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// Replay every unprocessed row in ledger order inside one transaction.
    /// Called once at startup before the game loop opens; the server must
    /// not start if this fails.
    ///
    /// Idempotence: the item reparent names the expected current owner in
    /// its WHERE clause, so rows already moved by an earlier partial
    /// recovery match zero rows and are skipped harmlessly. Rows
    /// referencing missing characters are logged and skipped, not fatal.
    /// Returns the number of entries applied.
    pub fn recover(&mut self) -> Result<usize, PersistError> {
        struct Row {
            id: i64,
            from_char: i32,
            to_char: i32,
            item_id: i32,
            gold_amount: i64,
        }

        let rows: Vec<Row> = {
            let mut stmt = self.conn.prepare(
                "SELECT id, from_char, to_char, item_id, gold_amount
                 FROM economic_wal WHERE processed = 0 ORDER BY id",
            )?;
            let result = stmt
                .query_map([], |row| {
                    Ok(Row {
                        id: row.get(0)?,
                        from_char: row.get(1)?,
                        to_char: row.get(2)?,
                        item_id: row.get(3)?,
                        gold_amount: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            result
        };

        if rows.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut applied = 0usize;

        for row in &rows {
            let char_exists = |id: i32| -> Result<bool, rusqlite::Error> {
                tx.query_row("SELECT 1 FROM characters WHERE id = ?1", [id], |_| Ok(()))
                    .optional()
                    .map(|found| found.is_some())
            };

            let mut corrupt = false;
            for side in [row.from_char, row.to_char] {
                if side > 0 && !char_exists(side)? {
                    tracing::warn!(
                        ledger_id = row.id,
                        char_id = side,
                        "wal row references missing character, skipping"
                    );
                    corrupt = true;
                }
            }

            if !corrupt {
                if row.gold_amount > 0 && row.from_char > 0 && row.to_char > 0 {
                    tx.execute(
                        "UPDATE characters SET adena = adena - ?1 WHERE id = ?2",
                        params![row.gold_amount, row.from_char],
                    )?;
                    tx.execute(
                        "UPDATE characters SET adena = adena + ?1 WHERE id = ?2",
                        params![row.gold_amount, row.to_char],
                    )?;
                }

                if row.item_id > 0 && row.from_char > 0 && row.to_char > 0 {
                    // Guarded by the expected current owner: re-running after
                    // partial success matches zero rows.
                    tx.execute(
                        "UPDATE character_items SET char_id = ?1
                         WHERE id = ?2 AND char_id = ?3",
                        params![row.to_char, row.item_id, row.from_char],
                    )?;
                }
                applied += 1;
            }

            tx.execute(
                "UPDATE economic_wal SET processed = 1 WHERE id = ?1",
                [row.id],
            )?;
        }

        tx.commit()?;
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::GameDb;

    fn seed_char(db: &GameDb, name: &str, adena: i64) -> i32 {
        db.characters()
            .create(name, name, adena)
            .expect("create character")
    }

    fn adena_of(db: &GameDb, id: i32) -> i64 {
        db.characters().load(id).unwrap().adena
    }

    #[test]
    fn recovery_replays_gold_exactly_once() {
        let mut db = GameDb::open_memory().unwrap();
        let from = seed_char(&db, "seller", 3000);
        let to = seed_char(&db, "buyer", 500);

        db.wal()
            .write(&[WalEntry::gold(TxKind::Trade, from, to, 1000)])
            .unwrap();

        let applied = db.wal().recover().unwrap();
        assert_eq!(applied, 1);
        assert_eq!(adena_of(&db, from), 2000);
        assert_eq!(adena_of(&db, to), 1500);

        // Idempotence: a second recovery applies nothing.
        let applied = db.wal().recover().unwrap();
        assert_eq!(applied, 0);
        assert_eq!(adena_of(&db, from), 2000);
        assert_eq!(adena_of(&db, to), 1500);
    }

    #[test]
    fn recovery_reparents_item_guarded_by_owner() {
        let mut db = GameDb::open_memory().unwrap();
        let from = seed_char(&db, "a", 0);
        let to = seed_char(&db, "b", 0);
        let item = db
            .items()
            .insert(from, 1, 1, 0, 100, false)
            .unwrap();

        db.wal()
            .write(&[WalEntry::item(TxKind::Trade, from, to, item, 1, 0)])
            .unwrap();
        assert_eq!(db.wal().recover().unwrap(), 1);

        let owned = db.items().load_for_char(to).unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, item);
        assert!(db.items().load_for_char(from).unwrap().is_empty());

        // Replaying against the already-moved item changes nothing.
        db.wal()
            .write(&[WalEntry::item(TxKind::Trade, from, to, item, 1, 0)])
            .unwrap();
        db.wal().recover().unwrap();
        assert_eq!(db.items().load_for_char(to).unwrap().len(), 1);
    }

    #[test]
    fn corrupt_row_is_skipped_not_fatal() {
        let mut db = GameDb::open_memory().unwrap();
        let real = seed_char(&db, "real", 100);

        db.wal()
            .write(&[
                WalEntry::gold(TxKind::Trade, 424242, real, 50), // missing from_char
                WalEntry::gold(TxKind::Trade, real, real, 0),
            ])
            .unwrap();

        let applied = db.wal().recover().unwrap();
        assert_eq!(applied, 1);
        assert_eq!(adena_of(&db, real), 100);
        // The corrupt row is still consumed.
        assert_eq!(db.wal().unprocessed_count().unwrap(), 0);
    }

    #[test]
    fn mark_processed_flips_all_rows() {
        let mut db = GameDb::open_memory().unwrap();
        let a = seed_char(&db, "a", 0);
        let b = seed_char(&db, "b", 0);

        db.wal()
            .write(&[
                WalEntry::gold(TxKind::Shop, a, b, 10),
                WalEntry::gold(TxKind::Auction, b, a, 20),
            ])
            .unwrap();
        assert_eq!(db.wal().unprocessed_count().unwrap(), 2);

        let flipped = db.wal().mark_processed().unwrap();
        assert_eq!(flipped, 2);
        assert_eq!(db.wal().unprocessed_count().unwrap(), 0);

        // Nothing left for recovery.
        assert_eq!(db.wal().recover().unwrap(), 0);
    }

    #[test]
    fn unknown_tx_kind_replays_as_generic_transfer() {
        let mut db = GameDb::open_memory().unwrap();
        let from = seed_char(&db, "x", 100);
        let to = seed_char(&db, "y", 0);

        db.wal()
            .write(&[WalEntry::gold(TxKind::parse("wedding"), from, to, 30)])
            .unwrap();
        assert_eq!(db.wal().recover().unwrap(), 1);
        assert_eq!(adena_of(&db, from), 70);
        assert_eq!(adena_of(&db, to), 30);
    }

    #[test]
    fn tx_kind_round_trips() {
        for kind in [TxKind::Trade, TxKind::Shop, TxKind::Auction] {
            assert_eq!(TxKind::parse(kind.as_str()), kind);
        }
        assert_eq!(
            TxKind::parse("wedding"),
            TxKind::Other("wedding".to_string())
        );
    }
}
