pub mod index;
pub mod properties;

pub use index::{TileEntry, TileIndex, NO_TILE};
pub use properties::{TileDefinitions, TileFlags, TileMetadata};
