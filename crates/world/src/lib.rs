pub mod aoi;
pub mod door;
pub mod entities;
pub mod gametime;
pub mod state;
pub mod tile_grid;

pub use aoi::{chebyshev, AoiGrid, VisDiff, CELL_SIZE, VISIBILITY_RANGE};
pub use door::DoorInfo;
pub use entities::{
    heading_delta, Buff, EquipKind, GroundItem, InvItem, NpcInfo, NpcRole, PlayerInfo, SummonInfo,
};
pub use gametime::GameTime;
pub use state::{World, WorldError};
pub use tile_grid::TileGrid;
