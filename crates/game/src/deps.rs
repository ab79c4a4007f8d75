use data::{DoorTable, ItemTable, MapData, NpcTable, PolymorphTable, SkillTable, SpawnTable, TeleportTable};
use persistence::GameDb;

/// World tunables the game systems consult each tick, converted from the
/// top-level config at boot.
#[derive(Debug, Clone)]
pub struct Tuning {
    pub ground_item_expiry_ticks: u64,
    pub party_refresh_ticks: u64,
    pub batch_interval_ticks: u64,
    pub initial_food: i32,
    pub max_exclude_list: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ground_item_expiry_ticks: 300,
            party_refresh_ticks: 25,
            batch_interval_ticks: 1500,
            initial_food: 40,
            max_exclude_list: 16,
        }
    }
}

/// Multipliers applied to gameplay outcomes.
#[derive(Debug, Clone)]
pub struct Rates {
    pub exp_rate: f64,
    pub drop_rate: f64,
    pub gold_rate: f64,
    pub lawful_rate: f64,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            exp_rate: 1.0,
            drop_rate: 1.0,
            gold_rate: 1.0,
            lawful_rate: 1.0,
        }
    }
}

/// All static data tables, loaded once at boot and immutable after.
pub struct Tables {
    pub npcs: NpcTable,
    pub spawns: SpawnTable,
    pub items: ItemTable,
    pub skills: SkillTable,
    pub maps: MapData,
    pub doors: DoorTable,
    pub teleports: TeleportTable,
    pub polymorphs: PolymorphTable,
}

/// Shared dependencies injected into handlers and systems. Owned by the
/// tick thread; the database handle is used synchronously (the documented
/// hot path for WAL commits).
pub struct Deps {
    pub tuning: Tuning,
    pub rates: Rates,
    pub tables: Tables,
    pub db: GameDb,
}
