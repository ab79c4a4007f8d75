//! Load/save plumbing between PlayerInfo and the repositories.

use std::collections::{HashMap, HashSet};

use persistence::{BuffRow, CharacterRow, GameDb, PersistError};
use session::SessionId;
use world::{Buff, InvItem, PlayerInfo};

/// Build an in-world player from its persisted rows: character, inventory,
/// buffs (restored with their remaining duration, then cleared), buddy and
/// exclude lists.
pub fn load_player(
    db: &GameDb,
    row: &CharacterRow,
    session_id: SessionId,
) -> Result<PlayerInfo, PersistError> {
    let inventory: Vec<InvItem> = db
        .items()
        .load_for_char(row.id)?
        .into_iter()
        .map(|i| InvItem {
            id: i.id,
            item_id: i.item_id,
            count: i.count,
            durability: i.durability,
            enchant_lvl: i.enchant_lvl,
            bless: i.bless,
            equipped: i.equipped,
        })
        .collect();

    let mut buffs = HashMap::new();
    for b in db.buffs().load(row.id)? {
        buffs.insert(
            b.skill_id,
            Buff {
                skill_id: b.skill_id,
                remaining_secs: b.remaining_secs,
                poly_id: b.poly_id,
            },
        );
    }
    db.buffs().clear(row.id)?;

    let buddies: HashSet<String> = db.buddies().list(row.id)?.into_iter().collect();
    let excludes: HashSet<String> = db.excludes().list(row.id)?.into_iter().collect();

    Ok(PlayerInfo {
        session_id,
        char_id: row.id,
        account: row.account.clone(),
        name: row.name.clone(),
        map_id: row.map_id,
        x: row.x,
        y: row.y,
        heading: row.heading,
        level: row.level,
        hp: row.hp,
        max_hp: row.max_hp,
        mp: row.mp,
        max_mp: row.max_mp,
        exp: row.exp,
        food: row.food,
        lawful: row.lawful,
        adena: row.adena,
        inventory,
        equipment: HashMap::new(),
        buffs,
        party_id: 0,
        clan_id: 0,
        buddies,
        excludes,
        dead: false,
        paralyzed: false,
        sleeped: false,
        pending_teleport: false,
        last_move_millis: 0,
        move_speed: world::entities::MOVE_SPEED_NORMAL,
    })
}

/// Write a player's mutable state back: character row plus remaining buff
/// durations. Called on exit, on return-to-select, and by the persistence
/// batch.
pub fn save_player(db: &GameDb, p: &PlayerInfo) -> Result<(), PersistError> {
    db.characters().save(&character_row(p))?;

    let buff_rows: Vec<BuffRow> = p
        .buffs
        .values()
        .map(|b| BuffRow {
            char_id: p.char_id,
            skill_id: b.skill_id,
            remaining_secs: b.remaining_secs,
            poly_id: b.poly_id,
        })
        .collect();
    db.buffs().save_all(p.char_id, &buff_rows)?;
    Ok(())
}

fn character_row(p: &PlayerInfo) -> CharacterRow {
    CharacterRow {
        id: p.char_id,
        account: p.account.clone(),
        name: p.name.clone(),
        level: p.level,
        map_id: p.map_id,
        x: p.x,
        y: p.y,
        heading: p.heading,
        hp: p.hp,
        max_hp: p.max_hp,
        mp: p.mp,
        max_mp: p.max_mp,
        exp: p.exp,
        food: p.food,
        lawful: p.lawful,
        adena: p.adena,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_save_round_trip() {
        let db = GameDb::open_memory().unwrap();
        let id = db.characters().create("acct", "Hero", 500).unwrap();
        db.items().insert(id, 40308, 100, 0, 0, false).unwrap();
        db.buffs()
            .save_all(
                id,
                &[BuffRow {
                    char_id: id,
                    skill_id: 26,
                    remaining_secs: 120,
                    poly_id: 0,
                }],
            )
            .unwrap();

        let row = db.characters().load(id).unwrap();
        let mut player = load_player(&db, &row, SessionId(1)).unwrap();
        assert_eq!(player.adena, 500);
        assert_eq!(player.inventory.len(), 1);
        assert_eq!(player.buffs[&26].remaining_secs, 120);
        // Restored buffs are consumed from the table.
        assert!(db.buffs().load(id).unwrap().is_empty());

        player.x = 33000;
        player.level = 9;
        player.buffs.get_mut(&26).unwrap().remaining_secs = 60;
        save_player(&db, &player).unwrap();

        let saved = db.characters().load(id).unwrap();
        assert_eq!(saved.x, 33000);
        assert_eq!(saved.level, 9);
        let buffs = db.buffs().load(id).unwrap();
        assert_eq!(buffs.len(), 1);
        assert_eq!(buffs[0].remaining_secs, 60);
    }
}
