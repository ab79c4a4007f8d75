use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use session::SessionId;

use crate::aoi::{chebyshev, AoiGrid, VISIBILITY_RANGE};
use crate::door::DoorInfo;
use crate::entities::{GroundItem, NpcInfo, PlayerInfo, SummonInfo};
use crate::tile_grid::TileGrid;

#[derive(Debug, PartialEq, Eq)]
pub enum WorldError {
    NameTaken(String),
    DuplicateChar(i32),
    DuplicateSession(SessionId),
}

impl std::fmt::Display for WorldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameTaken(name) => write!(f, "character name already online: {name}"),
            Self::DuplicateChar(id) => write!(f, "character already in world: {id}"),
            Self::DuplicateSession(id) => write!(f, "session already has a character: {id}"),
        }
    }
}

impl std::error::Error for WorldError {}

/// Authoritative in-memory registry of everything in-world, owned by the
/// tick thread. All indexes are updated atomically with respect to one
/// another: every mutator leaves entity attributes, AOI grids, and the
/// tile grid agreeing before it returns.
#[derive(Debug, Default)]
pub struct World {
    players: BTreeMap<SessionId, PlayerInfo>,
    char_index: HashMap<i32, SessionId>,
    /// lowercase(name) -> session.
    name_index: HashMap<String, SessionId>,

    npcs: BTreeMap<i32, NpcInfo>,
    ground_items: BTreeMap<i32, GroundItem>,
    doors: BTreeMap<i32, DoorInfo>,
    summons: BTreeMap<i32, SummonInfo>,

    player_grid: AoiGrid<SessionId>,
    npc_grid: AoiGrid<i32>,
    item_grid: AoiGrid<i32>,
    door_grid: AoiGrid<i32>,
    summon_grid: AoiGrid<i32>,

    pub tiles: TileGrid,

    pub weather: u8,
    /// Game hour observed by the weather system last tick; -1 before the
    /// first observation.
    pub last_hour: i32,
}

impl World {
    pub fn new() -> Self {
        Self {
            last_hour: -1,
            ..Self::default()
        }
    }

    // --- players ---

    pub fn add_player(&mut self, player: PlayerInfo) -> Result<(), WorldError> {
        let lower = player.name.to_lowercase();
        if self.name_index.contains_key(&lower) {
            return Err(WorldError::NameTaken(player.name));
        }
        if self.char_index.contains_key(&player.char_id) {
            return Err(WorldError::DuplicateChar(player.char_id));
        }
        if self.players.contains_key(&player.session_id) {
            return Err(WorldError::DuplicateSession(player.session_id));
        }

        self.player_grid
            .add(player.session_id, player.x, player.y, player.map_id);
        self.tiles
            .occupy(player.map_id, player.x, player.y, player.char_id);
        self.char_index.insert(player.char_id, player.session_id);
        self.name_index.insert(lower, player.session_id);
        self.players.insert(player.session_id, player);
        Ok(())
    }

    /// Remove across every index; returns the player for persistence.
    pub fn remove_player(&mut self, session_id: SessionId) -> Option<PlayerInfo> {
        let player = self.players.remove(&session_id)?;
        self.char_index.remove(&player.char_id);
        self.name_index.remove(&player.name.to_lowercase());
        self.player_grid
            .remove(session_id, player.x, player.y, player.map_id);
        self.tiles
            .vacate(player.map_id, player.x, player.y, player.char_id);
        Some(player)
    }

    pub fn player(&self, session_id: SessionId) -> Option<&PlayerInfo> {
        self.players.get(&session_id)
    }

    pub fn player_mut(&mut self, session_id: SessionId) -> Option<&mut PlayerInfo> {
        self.players.get_mut(&session_id)
    }

    pub fn player_by_char_id(&self, char_id: i32) -> Option<&PlayerInfo> {
        self.players.get(self.char_index.get(&char_id)?)
    }

    pub fn session_by_char_id(&self, char_id: i32) -> Option<SessionId> {
        self.char_index.get(&char_id).copied()
    }

    /// Case-insensitive online-name lookup.
    pub fn player_by_name(&self, name: &str) -> Option<&PlayerInfo> {
        self.players.get(self.name_index.get(&name.to_lowercase())?)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player_sessions(&self) -> Vec<SessionId> {
        self.players.keys().copied().collect()
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerInfo> {
        self.players.values()
    }

    /// Commit a position change: entity attributes, AOI cell, and tile
    /// occupancy move together.
    pub fn update_position(
        &mut self,
        session_id: SessionId,
        new_x: i32,
        new_y: i32,
        new_map: i16,
        heading: u8,
    ) {
        let Some(player) = self.players.get_mut(&session_id) else {
            return;
        };
        let (old_x, old_y, old_map) = (player.x, player.y, player.map_id);
        player.x = new_x;
        player.y = new_y;
        player.map_id = new_map;
        player.heading = heading;
        let char_id = player.char_id;
        let dead = player.dead;

        self.player_grid
            .move_entity(session_id, old_x, old_y, old_map, new_x, new_y, new_map);
        self.tiles.vacate(old_map, old_x, old_y, char_id);
        if !dead {
            self.tiles.occupy(new_map, new_x, new_y, char_id);
        }
    }

    /// Mark a tile passable after a death (the corpse stays perceivable).
    pub fn vacate_entity(&mut self, map: i16, x: i32, y: i32, id: i32) {
        self.tiles.vacate(map, x, y, id);
    }

    pub fn is_occupied(&self, x: i32, y: i32, map: i16, self_id: i32) -> bool {
        self.tiles.is_occupied(map, x, y, self_id)
    }

    // --- npcs ---

    pub fn add_npc(&mut self, npc: NpcInfo) {
        self.npc_grid.add(npc.id, npc.x, npc.y, npc.map_id);
        if !npc.dead {
            self.tiles.occupy(npc.map_id, npc.x, npc.y, npc.id);
        }
        self.npcs.insert(npc.id, npc);
    }

    pub fn remove_npc(&mut self, id: i32) -> Option<NpcInfo> {
        let npc = self.npcs.remove(&id)?;
        self.npc_grid.remove(id, npc.x, npc.y, npc.map_id);
        self.tiles.vacate(npc.map_id, npc.x, npc.y, npc.id);
        Some(npc)
    }

    pub fn npc(&self, id: i32) -> Option<&NpcInfo> {
        self.npcs.get(&id)
    }

    pub fn npc_mut(&mut self, id: i32) -> Option<&mut NpcInfo> {
        self.npcs.get_mut(&id)
    }

    pub fn npc_ids(&self) -> Vec<i32> {
        self.npcs.keys().copied().collect()
    }

    pub fn npc_count(&self) -> usize {
        self.npcs.len()
    }

    pub fn move_npc(&mut self, id: i32, new_x: i32, new_y: i32, heading: u8) {
        let Some(npc) = self.npcs.get_mut(&id) else {
            return;
        };
        let (old_x, old_y, map) = (npc.x, npc.y, npc.map_id);
        npc.x = new_x;
        npc.y = new_y;
        npc.heading = heading;
        self.npc_grid
            .move_entity(id, old_x, old_y, map, new_x, new_y, map);
        self.tiles.vacate(map, old_x, old_y, id);
        self.tiles.occupy(map, new_x, new_y, id);
    }

    /// Death: the tile frees up immediately, the corpse remains in AOI so
    /// viewers still perceive it until removal or respawn.
    pub fn kill_npc(&mut self, id: i32, current_tick: u64) {
        let Some(npc) = self.npcs.get_mut(&id) else {
            return;
        };
        npc.dead = true;
        npc.hp = 0;
        npc.respawn_at_tick = current_tick + npc.respawn_delay_ticks;
        let (map, x, y) = (npc.map_id, npc.x, npc.y);
        self.tiles.vacate(map, x, y, id);
    }

    /// Respawn at the spawn anchor. Returns (corpse position, spawn
    /// position) so the caller can emit remove/appear packets.
    pub fn revive_npc(&mut self, id: i32) -> Option<((i32, i32), (i32, i32))> {
        let npc = self.npcs.get_mut(&id)?;
        let corpse = (npc.x, npc.y);
        let spawn = (npc.spawn_x, npc.spawn_y);
        let map = npc.map_id;
        npc.x = npc.spawn_x;
        npc.y = npc.spawn_y;
        npc.hp = npc.max_hp;
        npc.dead = false;
        npc.respawn_at_tick = 0;
        self.npc_grid
            .move_entity(id, corpse.0, corpse.1, map, spawn.0, spawn.1, map);
        self.tiles.occupy(map, spawn.0, spawn.1, id);
        Some((corpse, spawn))
    }

    // --- ground items ---

    pub fn add_ground_item(&mut self, item: GroundItem) {
        self.item_grid.add(item.id, item.x, item.y, item.map_id);
        self.ground_items.insert(item.id, item);
    }

    pub fn remove_ground_item(&mut self, id: i32) -> Option<GroundItem> {
        let item = self.ground_items.remove(&id)?;
        self.item_grid.remove(id, item.x, item.y, item.map_id);
        Some(item)
    }

    pub fn ground_item(&self, id: i32) -> Option<&GroundItem> {
        self.ground_items.get(&id)
    }

    pub fn expired_ground_items(&self, current_tick: u64) -> Vec<i32> {
        self.ground_items
            .values()
            .filter(|g| g.expires_at_tick <= current_tick)
            .map(|g| g.id)
            .collect()
    }

    // --- doors ---

    pub fn add_door(&mut self, door: DoorInfo) {
        self.door_grid.add(door.id, door.x, door.y, door.map_id);
        if !door.is_passable() {
            self.tiles
                .occupy(door.map_id, door.entrance_x(), door.entrance_y(), door.id);
        }
        self.doors.insert(door.id, door);
    }

    pub fn door(&self, id: i32) -> Option<&DoorInfo> {
        self.doors.get(&id)
    }

    pub fn door_mut(&mut self, id: i32) -> Option<&mut DoorInfo> {
        self.doors.get_mut(&id)
    }

    pub fn door_ids(&self) -> Vec<i32> {
        self.doors.keys().copied().collect()
    }

    /// Open or close a door, keeping the entrance tile's passability in
    /// sync. Returns true when the state changed.
    pub fn set_door_open(&mut self, id: i32, open: bool) -> bool {
        let Some(door) = self.doors.get_mut(&id) else {
            return false;
        };
        let changed = if open { door.open() } else { door.close() };
        if changed {
            let (map, ex, ey) = (door.map_id, door.entrance_x(), door.entrance_y());
            if door.is_passable() {
                self.tiles.vacate(map, ex, ey, id);
            } else {
                self.tiles.occupy(map, ex, ey, id);
            }
        }
        changed
    }

    /// Apply damage to a door; on death the entrance tile frees up.
    /// Returns true when the door just died.
    pub fn damage_door(&mut self, id: i32, damage: i32) -> bool {
        let Some(door) = self.doors.get_mut(&id) else {
            return false;
        };
        let died = door.receive_damage(damage);
        if died {
            let (map, ex, ey) = (door.map_id, door.entrance_x(), door.entrance_y());
            self.tiles.vacate(map, ex, ey, id);
        }
        died
    }

    // --- summons ---

    pub fn add_summon(&mut self, summon: SummonInfo) {
        self.summon_grid
            .add(summon.id, summon.x, summon.y, summon.map_id);
        self.tiles
            .occupy(summon.map_id, summon.x, summon.y, summon.id);
        self.summons.insert(summon.id, summon);
    }

    pub fn remove_summon(&mut self, id: i32) -> Option<SummonInfo> {
        let summon = self.summons.remove(&id)?;
        self.summon_grid.remove(id, summon.x, summon.y, summon.map_id);
        self.tiles.vacate(summon.map_id, summon.x, summon.y, id);
        Some(summon)
    }

    pub fn summon(&self, id: i32) -> Option<&SummonInfo> {
        self.summons.get(&id)
    }

    // --- nearby queries ---
    // Each materializes exactly the 3x3 cell neighborhood, filters by exact
    // Chebyshev distance, and returns ids in ascending order.

    pub fn nearby_player_ids(
        &self,
        x: i32,
        y: i32,
        map: i16,
        exclude: Option<SessionId>,
    ) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self
            .player_grid
            .get_nearby(x, y, map)
            .into_iter()
            .filter(|sid| Some(*sid) != exclude)
            .filter(|sid| {
                self.players
                    .get(sid)
                    .map(|p| chebyshev(p.x, p.y, x, y) <= VISIBILITY_RANGE)
                    .unwrap_or(false)
            })
            .collect();
        ids.sort();
        ids
    }

    pub fn get_nearby_players(
        &self,
        x: i32,
        y: i32,
        map: i16,
        exclude: Option<SessionId>,
    ) -> Vec<&PlayerInfo> {
        self.nearby_player_ids(x, y, map, exclude)
            .into_iter()
            .filter_map(|sid| self.players.get(&sid))
            .collect()
    }

    pub fn nearby_npc_ids(&self, x: i32, y: i32, map: i16) -> Vec<i32> {
        self.nearby_of(&self.npc_grid, x, y, map, |id| {
            self.npcs.get(&id).map(|n| (n.x, n.y))
        })
    }

    pub fn get_nearby_npcs(&self, x: i32, y: i32, map: i16) -> Vec<&NpcInfo> {
        self.nearby_npc_ids(x, y, map)
            .into_iter()
            .filter_map(|id| self.npcs.get(&id))
            .collect()
    }

    pub fn nearby_ground_item_ids(&self, x: i32, y: i32, map: i16) -> Vec<i32> {
        self.nearby_of(&self.item_grid, x, y, map, |id| {
            self.ground_items.get(&id).map(|g| (g.x, g.y))
        })
    }

    pub fn nearby_door_ids(&self, x: i32, y: i32, map: i16) -> Vec<i32> {
        self.nearby_of(&self.door_grid, x, y, map, |id| {
            self.doors.get(&id).map(|d| (d.x, d.y))
        })
    }

    pub fn nearby_summon_ids(&self, x: i32, y: i32, map: i16) -> Vec<i32> {
        self.nearby_of(&self.summon_grid, x, y, map, |id| {
            self.summons.get(&id).map(|s| (s.x, s.y))
        })
    }

    fn nearby_of<F>(&self, grid: &AoiGrid<i32>, x: i32, y: i32, map: i16, pos: F) -> Vec<i32>
    where
        F: Fn(i32) -> Option<(i32, i32)>,
    {
        let mut ids: Vec<i32> = grid
            .get_nearby(x, y, map)
            .into_iter()
            .filter(|&id| {
                pos(id)
                    .map(|(ex, ey)| chebyshev(ex, ey, x, y) <= VISIBILITY_RANGE)
                    .unwrap_or(false)
            })
            .collect();
        ids.sort();
        ids
    }

    // --- weather ---

    pub fn randomize_weather(&mut self) {
        self.weather = rand::thread_rng().gen_range(0..4);
    }
}
