pub mod door;
pub mod error;
pub mod item;
pub mod map;
pub mod npc;
pub mod polymorph;
pub mod skill;
pub mod teleport;

pub use door::{DoorGfx, DoorSpawn, DoorTable};
pub use error::DataError;
pub use item::{ItemKind, ItemTable, ItemTemplate};
pub use map::{MapData, MapSpec};
pub use npc::{NpcTable, NpcTemplate, SpawnEntry, SpawnTable};
pub use polymorph::{Polymorph, PolymorphTable};
pub use skill::{SkillTable, SkillTemplate};
pub use teleport::{TeleportEntry, TeleportTable};

use std::path::Path;

/// Read and parse one YAML document. Shared by every loader so errors carry
/// the file path.
pub(crate) fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| DataError::Parse {
        path: path.display().to_string(),
        source,
    })
}
