use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::DataError;
use crate::load_yaml;

/// Static template for one castable skill.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillTemplate {
    pub id: i32,
    pub name: String,
    pub mp_cost: i32,
    #[serde(default)]
    pub hp_cost: i32,
    /// Maximum cast range in tiles; 0 = self-cast only.
    #[serde(default)]
    pub range: i32,
    /// Buff duration in seconds; 0 = instant effect.
    #[serde(default)]
    pub duration_secs: i32,
    /// Damage (positive) or heal (negative) base power.
    #[serde(default)]
    pub power: i32,
    /// Polymorph gfx for shape-change buffs, 0 = none.
    #[serde(default)]
    pub poly_id: i32,
}

#[derive(Debug, Deserialize)]
struct SkillFile {
    skills: Vec<SkillTemplate>,
}

#[derive(Debug)]
pub struct SkillTable {
    by_id: HashMap<i32, SkillTemplate>,
}

impl SkillTable {
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let file: SkillFile = load_yaml(path)?;
        let mut by_id = HashMap::with_capacity(file.skills.len());
        for template in file.skills {
            let id = template.id;
            if by_id.insert(id, template).is_some() {
                return Err(DataError::DuplicateId { table: "skills", id });
            }
        }
        Ok(Self { by_id })
    }

    pub fn get(&self, id: i32) -> Option<&SkillTemplate> {
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
    fn loads_skills() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
skills:
  - {{ id: 1, name: energy bolt, mp_cost: 4, range: 10, power: 12 }}
  - {{ id: 26, name: haste, mp_cost: 10, duration_secs: 300 }}
  - {{ id: 9, name: heal, mp_cost: 6, range: 3, power: -15 }}
"#
        )
        .unwrap();
        let table = SkillTable::load(f.path()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(1).unwrap().power, 12);
        assert_eq!(table.get(26).unwrap().duration_secs, 300);
        assert_eq!(table.get(9).unwrap().power, -15);
        assert!(table.get(999).is_none());
    }
}
