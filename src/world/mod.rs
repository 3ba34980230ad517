//! Loaded maps and how they are stacked. Everything the exporter reads about
//! the authored world goes through this module.

pub mod map;
pub mod loader;
pub mod composite;
#[allow(clippy::module_inception)]
pub mod world;

pub use map::{CellRef, MapObject, ObjectGroup, Orientation, TileLayer, TileMap, Tileset};
pub use loader::{JsonMapLoader, MapLoader, MemoryMapLoader};
pub use composite::{MapComposite, Placement};
pub use world::{WorldCell, WorldLot, WorldObject, WorldSpec};
