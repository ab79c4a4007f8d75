use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::DataError;
use crate::load_yaml;

/// One polymorph shape a character can take.
#[derive(Debug, Clone, Deserialize)]
pub struct Polymorph {
    pub id: i32,
    pub name: String,
    /// Sprite gfx applied while polymorphed.
    pub poly_id: i32,
    #[serde(default)]
    pub min_level: i32,
}

#[derive(Debug, Deserialize)]
struct PolymorphFile {
    polymorphs: Vec<Polymorph>,
}

#[derive(Debug)]
pub struct PolymorphTable {
    by_id: HashMap<i32, Polymorph>,
    by_name: HashMap<String, i32>,
}

impl PolymorphTable {
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let file: PolymorphFile = load_yaml(path)?;
        let mut by_id = HashMap::with_capacity(file.polymorphs.len());
        let mut by_name = HashMap::with_capacity(file.polymorphs.len());
        for poly in file.polymorphs {
            let id = poly.id;
            by_name.insert(poly.name.to_lowercase(), id);
            if by_id.insert(id, poly).is_some() {
                return Err(DataError::DuplicateId {
                    table: "polymorphs",
                    id,
                });
            }
        }
        Ok(Self { by_id, by_name })
    }

    pub fn get(&self, id: i32) -> Option<&Polymorph> {
        self.by_id.get(&id)
    }

    /// Case-insensitive name lookup (the client sends the shape name).
    pub fn get_by_name(&self, name: &str) -> Option<&Polymorph> {
        self.by_id.get(self.by_name.get(&name.to_lowercase())?)
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
    fn lookup_by_id_and_name() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
polymorphs:
  - {{ id: 1, name: Floating Eye, poly_id: 1402, min_level: 10 }}
"#
        )
        .unwrap();
        let table = PolymorphTable::load(f.path()).unwrap();
        assert_eq!(table.get(1).unwrap().poly_id, 1402);
        assert_eq!(table.get_by_name("floating eye").unwrap().id, 1);
        assert!(table.get_by_name("nope").is_none());
    }
}
