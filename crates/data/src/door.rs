use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::DataError;
use crate::load_yaml;

/// Visual/geometric template for a door sprite.
#[derive(Debug, Clone, Deserialize)]
pub struct DoorGfx {
    pub gfx_id: i32,
    #[serde(default)]
    pub note: String,
    /// 0 = "/" (NE-SW), 1 = "\" (NW-SE).
    pub direction: i32,
    /// Tile offsets from the door center.
    pub left_edge_offset: i32,
    pub right_edge_offset: i32,
}

/// Spawn configuration for a single door instance.
#[derive(Debug, Clone, Deserialize)]
pub struct DoorSpawn {
    pub id: i32,
    pub gfx_id: i32,
    pub x: i32,
    pub y: i32,
    pub map_id: i16,
    /// 0 = indestructible.
    #[serde(default)]
    pub hp: i32,
    /// Clan keeper NPC id, 0 = public.
    #[serde(default)]
    pub keeper: i32,
    #[serde(default)]
    pub is_opening: bool,
}

#[derive(Debug, Deserialize)]
struct GfxFile {
    door_gfxs: Vec<DoorGfx>,
}

#[derive(Debug, Deserialize)]
struct SpawnFile {
    doors: Vec<DoorSpawn>,
}

/// All door GFX templates and spawn rows.
#[derive(Debug)]
pub struct DoorTable {
    gfx_by_id: HashMap<i32, DoorGfx>,
    spawns: Vec<DoorSpawn>,
}

impl DoorTable {
    pub fn load(gfx_path: &Path, spawn_path: &Path) -> Result<Self, DataError> {
        let gfx_file: GfxFile = load_yaml(gfx_path)?;
        let mut gfx_by_id = HashMap::with_capacity(gfx_file.door_gfxs.len());
        for gfx in gfx_file.door_gfxs {
            let id = gfx.gfx_id;
            if gfx_by_id.insert(id, gfx).is_some() {
                return Err(DataError::DuplicateId {
                    table: "door_gfxs",
                    id,
                });
            }
        }

        let spawn_file: SpawnFile = load_yaml(spawn_path)?;
        for spawn in &spawn_file.doors {
            if !gfx_by_id.contains_key(&spawn.gfx_id) {
                return Err(DataError::DanglingReference {
                    table: "doors",
                    reference: "gfx_id",
                    id: spawn.gfx_id,
                });
            }
        }

        Ok(Self {
            gfx_by_id,
            spawns: spawn_file.doors,
        })
    }

    pub fn gfx(&self, gfx_id: i32) -> Option<&DoorGfx> {
        self.gfx_by_id.get(&gfx_id)
    }

    pub fn spawns(&self) -> &[DoorSpawn] {
        &self.spawns
    }

    pub fn len(&self) -> usize {
        self.spawns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spawns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_gfx_and_spawns() {
        let mut gfx = NamedTempFile::new().unwrap();
        write!(
            gfx,
            r#"
door_gfxs:
  - {{ gfx_id: 88, note: castle gate, direction: 0, left_edge_offset: -1, right_edge_offset: 1 }}
"#
        )
        .unwrap();
        let mut spawns = NamedTempFile::new().unwrap();
        write!(
            spawns,
            r#"
doors:
  - {{ id: 1, gfx_id: 88, x: 100, y: 100, map_id: 4, hp: 500 }}
  - {{ id: 2, gfx_id: 88, x: 120, y: 100, map_id: 4, is_opening: true }}
"#
        )
        .unwrap();

        let table = DoorTable::load(gfx.path(), spawns.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.gfx(88).unwrap().direction, 0);
        assert_eq!(table.spawns()[0].hp, 500);
        assert!(table.spawns()[1].is_opening);
        assert_eq!(table.spawns()[1].hp, 0);
    }

    #[test]
    fn spawn_with_unknown_gfx_rejected() {
        let mut gfx = NamedTempFile::new().unwrap();
        write!(gfx, "door_gfxs: []\n").unwrap();
        let mut spawns = NamedTempFile::new().unwrap();
        write!(spawns, "doors:\n  - {{ id: 1, gfx_id: 77, x: 0, y: 0, map_id: 0 }}\n").unwrap();
        assert!(matches!(
            DoorTable::load(gfx.path(), spawns.path()),
            Err(DataError::DanglingReference { id: 77, .. })
        ));
    }
}
