use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::DataError;
use crate::load_yaml;

/// One teleport destination offered by gatekeepers.
#[derive(Debug, Clone, Deserialize)]
pub struct TeleportEntry {
    pub id: i32,
    pub name: String,
    pub map_id: i16,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub price: i64,
}

#[derive(Debug, Deserialize)]
struct TeleportFile {
    teleports: Vec<TeleportEntry>,
}

#[derive(Debug)]
pub struct TeleportTable {
    by_id: HashMap<i32, TeleportEntry>,
}

impl TeleportTable {
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let file: TeleportFile = load_yaml(path)?;
        let mut by_id = HashMap::with_capacity(file.teleports.len());
        for entry in file.teleports {
            let id = entry.id;
            if by_id.insert(id, entry).is_some() {
                return Err(DataError::DuplicateId {
                    table: "teleports",
                    id,
                });
            }
        }
        Ok(Self { by_id })
    }

    pub fn get(&self, id: i32) -> Option<&TeleportEntry> {
        self.by_id.get(&id)
    }

    /// Lowest-id destination on a map; used as that map's respawn anchor.
    pub fn first_on_map(&self, map_id: i16) -> Option<&TeleportEntry> {
        self.by_id
            .values()
            .filter(|e| e.map_id == map_id)
            .min_by_key(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_teleports() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
teleports:
  - {{ id: 1, name: giran, map_id: 4, x: 33430, y: 32814, price: 300 }}
  - {{ id: 2, name: orc forest, map_id: 4, x: 32900, y: 32600 }}
"#
        )
        .unwrap();
        let table = TeleportTable::load(f.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).unwrap().price, 300);
        assert_eq!(table.get(2).unwrap().price, 0);
    }
}
