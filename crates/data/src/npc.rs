use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::DataError;
use crate::load_yaml;

/// AI role tag as written in the data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NpcRoleTag {
    Monster,
    Guard,
    Merchant,
}

/// Static template for one NPC kind.
#[derive(Debug, Clone, Deserialize)]
pub struct NpcTemplate {
    pub id: i32,
    pub name: String,
    pub gfx_id: i32,
    pub level: i32,
    pub max_hp: i32,
    #[serde(default)]
    pub max_mp: i32,
    pub attack: i32,
    pub defense: i32,
    pub exp: i32,
    #[serde(default)]
    pub lawful: i32,
    pub role: NpcRoleTag,
    /// Ticks between wander steps.
    #[serde(default = "default_move_interval")]
    pub move_interval_ticks: u32,
}

fn default_move_interval() -> u32 {
    4
}

#[derive(Debug, Deserialize)]
struct NpcFile {
    npcs: Vec<NpcTemplate>,
}

/// Immutable NPC template lookup.
#[derive(Debug)]
pub struct NpcTable {
    by_id: HashMap<i32, NpcTemplate>,
}

impl NpcTable {
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let file: NpcFile = load_yaml(path)?;
        let mut by_id = HashMap::with_capacity(file.npcs.len());
        for template in file.npcs {
            let id = template.id;
            if by_id.insert(id, template).is_some() {
                return Err(DataError::DuplicateId {
                    table: "npcs",
                    id,
                });
            }
        }
        Ok(Self { by_id })
    }

    pub fn get(&self, id: i32) -> Option<&NpcTemplate> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// One spawn point: where and how many of a template enter the world.
#[derive(Debug, Clone, Deserialize)]
pub struct SpawnEntry {
    pub template_id: i32,
    pub map_id: i16,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub heading: u8,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_respawn")]
    pub respawn_delay_ticks: u64,
}

fn default_count() -> u32 {
    1
}

fn default_respawn() -> u64 {
    150
}

#[derive(Debug, Deserialize)]
struct SpawnFile {
    spawns: Vec<SpawnEntry>,
}

#[derive(Debug)]
pub struct SpawnTable {
    entries: Vec<SpawnEntry>,
}

impl SpawnTable {
    /// Load spawn entries, validating template references against the NPC
    /// table.
    pub fn load(path: &Path, npcs: &NpcTable) -> Result<Self, DataError> {
        let file: SpawnFile = load_yaml(path)?;
        for entry in &file.spawns {
            if npcs.get(entry.template_id).is_none() {
                return Err(DataError::DanglingReference {
                    table: "spawns",
                    reference: "template_id",
                    id: entry.template_id,
                });
            }
        }
        Ok(Self {
            entries: file.spawns,
        })
    }

    pub fn entries(&self) -> &[SpawnEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn npc_yaml() -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
npcs:
  - id: 45000
    name: orc
    gfx_id: 100
    level: 5
    max_hp: 60
    attack: 8
    defense: 2
    exp: 30
    role: monster
  - id: 45001
    name: town guard
    gfx_id: 200
    level: 30
    max_hp: 900
    max_mp: 50
    attack: 40
    defense: 20
    exp: 0
    role: guard
    move_interval_ticks: 8
"#
        )
        .unwrap();
        f
    }

    #[test]
    fn loads_templates_with_defaults() {
        let f = npc_yaml();
        let table = NpcTable::load(f.path()).unwrap();
        assert_eq!(table.len(), 2);

        let orc = table.get(45000).unwrap();
        assert_eq!(orc.name, "orc");
        assert_eq!(orc.role, NpcRoleTag::Monster);
        assert_eq!(orc.max_mp, 0);
        assert_eq!(orc.move_interval_ticks, 4);

        let guard = table.get(45001).unwrap();
        assert_eq!(guard.role, NpcRoleTag::Guard);
        assert_eq!(guard.move_interval_ticks, 8);
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
npcs:
  - {{ id: 1, name: a, gfx_id: 1, level: 1, max_hp: 1, attack: 1, defense: 1, exp: 1, role: monster }}
  - {{ id: 1, name: b, gfx_id: 1, level: 1, max_hp: 1, attack: 1, defense: 1, exp: 1, role: monster }}
"#
        )
        .unwrap();
        assert!(matches!(
            NpcTable::load(f.path()),
            Err(DataError::DuplicateId { table: "npcs", id: 1 })
        ));
    }

    #[test]
    fn spawns_validate_template_references() {
        let npc_file = npc_yaml();
        let npcs = NpcTable::load(npc_file.path()).unwrap();

        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
spawns:
  - {{ template_id: 45000, map_id: 4, x: 100, y: 100, count: 3 }}
  - {{ template_id: 45001, map_id: 4, x: 120, y: 80, respawn_delay_ticks: 300 }}
"#
        )
        .unwrap();
        let spawns = SpawnTable::load(f.path(), &npcs).unwrap();
        assert_eq!(spawns.len(), 2);
        assert_eq!(spawns.entries()[0].count, 3);
        assert_eq!(spawns.entries()[0].respawn_delay_ticks, 150);
        assert_eq!(spawns.entries()[1].respawn_delay_ticks, 300);
    }

    #[test]
    fn dangling_spawn_reference_rejected() {
        let npc_file = npc_yaml();
        let npcs = NpcTable::load(npc_file.path()).unwrap();

        let mut f = NamedTempFile::new().unwrap();
        write!(f, "spawns:\n  - {{ template_id: 99999, map_id: 4, x: 0, y: 0 }}\n").unwrap();
        assert!(matches!(
            SpawnTable::load(f.path(), &npcs),
            Err(DataError::DanglingReference { id: 99999, .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            NpcTable::load(Path::new("/nonexistent/npcs.yaml")),
            Err(DataError::Io { .. })
        ));
    }
}
