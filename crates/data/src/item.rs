use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::DataError;
use crate::load_yaml;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Weapon,
    Armor,
    Etc,
}

/// Static template for one item kind. Gold is itself an item template so
/// drops and ground stacks go through the same path.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemTemplate {
    pub id: i32,
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub weight: i32,
    /// Shop value in adena.
    #[serde(default)]
    pub value: i64,
    /// Highest enchant level that cannot fail.
    #[serde(default)]
    pub safe_enchant: i16,
    #[serde(default)]
    pub max_durability: i32,
    /// True for count-stacking items (arrows, potions, gold).
    #[serde(default)]
    pub stackable: bool,
}

#[derive(Debug, Deserialize)]
struct ItemFile {
    items: Vec<ItemTemplate>,
}

#[derive(Debug)]
pub struct ItemTable {
    by_id: HashMap<i32, ItemTemplate>,
}

impl ItemTable {
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let file: ItemFile = load_yaml(path)?;
        let mut by_id = HashMap::with_capacity(file.items.len());
        for template in file.items {
            let id = template.id;
            if by_id.insert(id, template).is_some() {
                return Err(DataError::DuplicateId { table: "items", id });
            }
        }
        Ok(Self { by_id })
    }

    pub fn get(&self, id: i32) -> Option<&ItemTemplate> {
        self.by_id.get(&id)
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
    fn loads_items() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
items:
  - {{ id: 40308, name: adena, kind: etc, stackable: true }}
  - {{ id: 1, name: short sword, kind: weapon, weight: 30, value: 50, safe_enchant: 6, max_durability: 100 }}
"#
        )
        .unwrap();
        let table = ItemTable::load(f.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.get(40308).unwrap().stackable);
        assert_eq!(table.get(1).unwrap().kind, ItemKind::Weapon);
        assert_eq!(table.get(1).unwrap().safe_enchant, 6);
    }

    #[test]
    fn duplicate_item_rejected() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            "items:\n  - {{ id: 1, name: a, kind: etc }}\n  - {{ id: 1, name: b, kind: etc }}\n"
        )
        .unwrap();
        assert!(matches!(
            ItemTable::load(f.path()),
            Err(DataError::DuplicateId { table: "items", id: 1 })
        ));
    }
}
