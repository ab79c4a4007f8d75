use rusqlite::Connection;

use crate::error::PersistError;

pub fn create_tables(conn: &Connection) -> Result<(), PersistError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS characters (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            account    TEXT NOT NULL,
            name       TEXT NOT NULL UNIQUE COLLATE NOCASE,
            level      INTEGER NOT NULL DEFAULT 1,
            map_id     INTEGER NOT NULL DEFAULT 4,
            x          INTEGER NOT NULL DEFAULT 0,
            y          INTEGER NOT NULL DEFAULT 0,
            heading    INTEGER NOT NULL DEFAULT 0,
            hp         INTEGER NOT NULL DEFAULT 1,
            max_hp     INTEGER NOT NULL DEFAULT 1,
            mp         INTEGER NOT NULL DEFAULT 0,
            max_mp     INTEGER NOT NULL DEFAULT 0,
            exp        INTEGER NOT NULL DEFAULT 0,
            food       INTEGER NOT NULL DEFAULT 40,
            lawful     INTEGER NOT NULL DEFAULT 0,
            adena      INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS character_items (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            char_id     INTEGER NOT NULL REFERENCES characters(id),
            item_id     INTEGER NOT NULL,
            count       INTEGER NOT NULL DEFAULT 1,
            enchant_lvl INTEGER NOT NULL DEFAULT 0,
            durability  INTEGER NOT NULL DEFAULT 0,
            bless       INTEGER NOT NULL DEFAULT 0,
            equipped    INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_character_items_char
            ON character_items(char_id);

        CREATE TABLE IF NOT EXISTS character_buffs (
            char_id        INTEGER NOT NULL REFERENCES characters(id),
            skill_id       INTEGER NOT NULL,
            remaining_secs INTEGER NOT NULL,
            poly_id        INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (char_id, skill_id)
        );

        CREATE TABLE IF NOT EXISTS buddies (
            char_id    INTEGER NOT NULL REFERENCES characters(id),
            buddy_name TEXT NOT NULL,
            PRIMARY KEY (char_id, buddy_name)
        );

        CREATE TABLE IF NOT EXISTS excludes (
            char_id       INTEGER NOT NULL REFERENCES characters(id),
            excluded_name TEXT NOT NULL,
            PRIMARY KEY (char_id, excluded_name)
        );

        CREATE TABLE IF NOT EXISTS economic_wal (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            tx_type     TEXT NOT NULL,
            from_char   INTEGER NOT NULL DEFAULT 0,
            to_char     INTEGER NOT NULL DEFAULT 0,
            item_id     INTEGER NOT NULL DEFAULT 0,
            count       INTEGER NOT NULL DEFAULT 0,
            enchant_lvl INTEGER NOT NULL DEFAULT 0,
            gold_amount INTEGER NOT NULL DEFAULT 0,
            processed   INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_economic_wal_unprocessed
            ON economic_wal(processed) WHERE processed = 0;
        ",
    )?;
    Ok(())
}
