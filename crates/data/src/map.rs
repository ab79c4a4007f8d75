use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::DataError;
use crate::load_yaml;

/// Static terrain description for one map: a bounding box plus the set of
/// permanently impassable tiles. Dynamic blocking from entities lives in
/// the world's tile-occupancy grid, not here; this table is immutable
/// after load.
#[derive(Debug, Clone, Deserialize)]
pub struct MapSpec {
    pub id: i16,
    pub origin_x: i32,
    pub origin_y: i32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub blocked: Vec<(i32, i32)>,
}

#[derive(Debug, Deserialize)]
struct MapFile {
    maps: Vec<MapSpec>,
}

#[derive(Debug)]
struct MapTerrain {
    origin_x: i32,
    origin_y: i32,
    width: u32,
    height: u32,
    blocked: HashSet<(i32, i32)>,
}

#[derive(Debug)]
pub struct MapData {
    maps: HashMap<i16, MapTerrain>,
}

impl MapData {
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let file: MapFile = load_yaml(path)?;
        let mut maps = HashMap::with_capacity(file.maps.len());
        for spec in file.maps {
            let id = spec.id;
            let terrain = MapTerrain {
                origin_x: spec.origin_x,
                origin_y: spec.origin_y,
                width: spec.width,
                height: spec.height,
                blocked: spec.blocked.into_iter().collect(),
            };
            if maps.insert(id, terrain).is_some() {
                return Err(DataError::DuplicateId {
                    table: "maps",
                    id: id as i32,
                });
            }
        }
        Ok(Self { maps })
    }

    pub fn known_map(&self, map: i16) -> bool {
        self.maps.contains_key(&map)
    }

    pub fn in_bounds(&self, map: i16, x: i32, y: i32) -> bool {
        self.maps.get(&map).is_some_and(|m| {
            x >= m.origin_x
                && x < m.origin_x + m.width as i32
                && y >= m.origin_y
                && y < m.origin_y + m.height as i32
        })
    }

    /// Static terrain passability. Unknown maps refuse everything; the
    /// caller falls back to the entity tile grid as a safety net.
    pub fn is_passable(&self, map: i16, x: i32, y: i32) -> bool {
        match self.maps.get(&map) {
            Some(m) => {
                self.in_bounds(map, x, y) && !m.blocked.contains(&(x, y))
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn table() -> MapData {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
maps:
  - id: 4
    origin_x: 0
    origin_y: 0
    width: 200
    height: 200
    blocked:
      - [10, 10]
      - [10, 11]
"#
        )
        .unwrap();
        MapData::load(f.path()).unwrap()
    }

    #[test]
    fn passability_respects_bounds_and_blocks() {
        let maps = table();
        assert!(maps.is_passable(4, 0, 0));
        assert!(maps.is_passable(4, 199, 199));
        assert!(!maps.is_passable(4, 200, 0));
        assert!(!maps.is_passable(4, -1, 0));
        assert!(!maps.is_passable(4, 10, 10));
        assert!(!maps.is_passable(4, 10, 11));
        assert!(maps.is_passable(4, 10, 12));
    }

    #[test]
    fn unknown_map_refuses_all() {
        let maps = table();
        assert!(!maps.known_map(99));
        assert!(!maps.is_passable(99, 0, 0));
    }
}
