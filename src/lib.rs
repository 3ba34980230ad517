//! Lot export
//!
//! Compiles authored tile maps and RoomDef annotations into the per-cell
//! `.lotheader`, `.lotpack` and `chunkdata` files the game streams at runtime.

pub mod codec;
pub mod config;
pub mod error;
pub mod generation;
pub mod navigation;
pub mod rooms;
pub mod tiles;
pub mod world;

pub use error::{Error, Result};
pub use config::GenerationConfig;
pub use codec::{
    CellGeometry, CellPosition, Rect,
    LotHeader, HeaderRoom, RoomObject,
    ChunkClass, ChunkRecord,
};
pub use generation::{GenerationReport, GenerationStats, LotFilesManager};
pub use navigation::ChunkDataFile256;
pub use rooms::{RoomGraph, RoomGraphBuilder};
pub use tiles::{TileDefinitions, TileIndex};
pub use world::{WorldSpec, TileMap};
