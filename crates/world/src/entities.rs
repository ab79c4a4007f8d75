use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI32, Ordering};

use session::SessionId;

// Object id ranges are carved by convention so a bare i32 id is
// unambiguous process-wide: character ids come from the repository and stay
// far below 200M.
const NPC_ID_BASE: i32 = 200_000_000;
const DOOR_ID_BASE: i32 = 300_000_000;
const SUMMON_ID_BASE: i32 = 400_000_000;
const GROUND_ITEM_ID_BASE: i32 = 500_000_000;

static NPC_ID_COUNTER: AtomicI32 = AtomicI32::new(NPC_ID_BASE);
static DOOR_ID_COUNTER: AtomicI32 = AtomicI32::new(DOOR_ID_BASE);
static SUMMON_ID_COUNTER: AtomicI32 = AtomicI32::new(SUMMON_ID_BASE);
static GROUND_ITEM_ID_COUNTER: AtomicI32 = AtomicI32::new(GROUND_ITEM_ID_BASE);

pub fn next_npc_id() -> i32 {
    NPC_ID_COUNTER.fetch_add(1, Ordering::Relaxed) + 1
}

pub fn next_door_id() -> i32 {
    DOOR_ID_COUNTER.fetch_add(1, Ordering::Relaxed) + 1
}

pub fn next_summon_id() -> i32 {
    SUMMON_ID_COUNTER.fetch_add(1, Ordering::Relaxed) + 1
}

pub fn next_ground_item_id() -> i32 {
    GROUND_ITEM_ID_COUNTER.fetch_add(1, Ordering::Relaxed) + 1
}

/// Movement speed tiers, used by the anti-speed check.
pub const MOVE_SPEED_NORMAL: u8 = 0;
pub const MOVE_SPEED_HASTED: u8 = 1;

/// Minimum milliseconds between move commands for a speed tier, with the
/// 80% tolerance already applied (200ms walk, 133ms hasted).
pub fn min_move_interval_millis(speed: u8) -> i64 {
    if speed == MOVE_SPEED_HASTED {
        106
    } else {
        160
    }
}

/// Tile delta for a heading (0 = north, clockwise through 7 = northwest).
pub fn heading_delta(heading: u8) -> (i32, i32) {
    const DX: [i32; 8] = [0, 1, 1, 1, 0, -1, -1, -1];
    const DY: [i32; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];
    let h = (heading & 7) as usize;
    (DX[h], DY[h])
}

/// Equipment slot kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipKind {
    Weapon,
    Armor,
    Helm,
    Shield,
    Gloves,
    Boots,
    Cloak,
    RingLeft,
    RingRight,
    Amulet,
    Belt,
}

/// One owned item instance.
#[derive(Debug, Clone)]
pub struct InvItem {
    /// Unique object id (repository-assigned).
    pub id: i32,
    /// Item template id.
    pub item_id: i32,
    pub count: i32,
    pub durability: i32,
    pub enchant_lvl: i16,
    pub bless: bool,
    pub equipped: bool,
}

/// An active buff on a character, keyed by skill id in the owner's map.
#[derive(Debug, Clone, Copy)]
pub struct Buff {
    pub skill_id: i32,
    pub remaining_secs: i32,
    /// Polymorph gfx while the buff holds, 0 if none.
    pub poly_id: i32,
}

/// One in-world character, exclusively owned by the World. The session
/// back-reference is the non-owning id; the cycle is broken on disconnect
/// by clearing both sides.
#[derive(Debug)]
pub struct PlayerInfo {
    pub session_id: SessionId,
    pub char_id: i32,
    pub account: String,
    pub name: String,
    pub map_id: i16,
    pub x: i32,
    pub y: i32,
    pub heading: u8,
    pub level: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub exp: i64,
    pub food: i32,
    pub lawful: i32,
    pub adena: i64,
    pub inventory: Vec<InvItem>,
    pub equipment: HashMap<EquipKind, i32>,
    pub buffs: HashMap<i32, Buff>,
    pub party_id: i32,
    pub clan_id: i32,
    pub buddies: HashSet<String>,
    pub excludes: HashSet<String>,
    pub dead: bool,
    pub paralyzed: bool,
    pub sleeped: bool,
    pub pending_teleport: bool,
    /// Wall-clock millis of the last accepted move command.
    pub last_move_millis: i64,
    pub move_speed: u8,
}

impl PlayerInfo {
    pub fn find_item(&self, object_id: i32) -> Option<&InvItem> {
        self.inventory.iter().find(|i| i.id == object_id)
    }

    pub fn find_item_mut(&mut self, object_id: i32) -> Option<&mut InvItem> {
        self.inventory.iter_mut().find(|i| i.id == object_id)
    }

    pub fn remove_item(&mut self, object_id: i32) -> Option<InvItem> {
        let idx = self.inventory.iter().position(|i| i.id == object_id)?;
        Some(self.inventory.remove(idx))
    }

    pub fn can_act(&self) -> bool {
        !self.dead && !self.paralyzed && !self.sleeped
    }
}

/// AI role tag for an NPC template instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcRole {
    Monster,
    Guard,
    Merchant,
}

/// One non-player entity in-world. AOI treats NPCs symmetrically with
/// players for perception.
#[derive(Debug)]
pub struct NpcInfo {
    /// Unique object id (NPC id range).
    pub id: i32,
    pub template_id: i32,
    pub name: String,
    pub gfx_id: i32,
    pub map_id: i16,
    pub x: i32,
    pub y: i32,
    pub heading: u8,
    pub level: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub attack: i32,
    pub defense: i32,
    pub exp: i32,
    pub role: NpcRole,
    pub dead: bool,
    /// Where the NPC respawns.
    pub spawn_x: i32,
    pub spawn_y: i32,
    pub respawn_delay_ticks: u64,
    /// Tick at which a dead NPC comes back; 0 while alive.
    pub respawn_at_tick: u64,
    /// Wander state: remaining steps in the current walk.
    pub wander_steps: i32,
    pub wander_heading: u8,
    /// Ticks until the next step is allowed.
    pub move_cooldown: u32,
    /// Ticks between wander steps, from the template.
    pub move_interval_ticks: u32,
}

/// A dropped item on a tile.
#[derive(Debug)]
pub struct GroundItem {
    /// Unique object id (ground-item id range).
    pub id: i32,
    pub item_id: i32,
    pub count: i32,
    pub enchant_lvl: i16,
    pub map_id: i16,
    pub x: i32,
    pub y: i32,
    /// Tick at which the item disappears.
    pub expires_at_tick: u64,
}

/// A player-owned summoned creature. Representative of the perceivable
/// classes that ride the same AOI grid shape (dolls, pets, followers).
#[derive(Debug)]
pub struct SummonInfo {
    /// Unique object id (summon id range).
    pub id: i32,
    pub owner_char_id: i32,
    pub template_id: i32,
    pub gfx_id: i32,
    pub map_id: i16,
    pub x: i32,
    pub y: i32,
    pub heading: u8,
    pub hp: i32,
    pub max_hp: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_ranges_are_disjoint() {
        let npc = next_npc_id();
        let door = next_door_id();
        let summon = next_summon_id();
        let item = next_ground_item_id();
        assert!((NPC_ID_BASE..DOOR_ID_BASE).contains(&npc));
        assert!((DOOR_ID_BASE..SUMMON_ID_BASE).contains(&door));
        assert!((SUMMON_ID_BASE..GROUND_ITEM_ID_BASE).contains(&summon));
        assert!(item > GROUND_ITEM_ID_BASE);
    }

    #[test]
    fn ids_are_monotonic() {
        let a = next_npc_id();
        let b = next_npc_id();
        assert!(b > a);
    }

    #[test]
    fn move_intervals_per_speed_tier() {
        assert_eq!(min_move_interval_millis(MOVE_SPEED_NORMAL), 160);
        assert_eq!(min_move_interval_millis(MOVE_SPEED_HASTED), 106);
    }
}
