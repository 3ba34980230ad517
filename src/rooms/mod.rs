//! Room and building topology from RoomDef annotations.
//!
//! RoomDef rectangles tagged `name#tag` merge with adjacent same-named
//! fragments on their floor into rooms. Rooms that touch on any floor form a
//! building.

pub mod defs;
pub mod graph;
pub mod spatial;

pub use defs::{room_rects_from_map, ISO_LEVEL_SKEW};
pub use graph::{rects_adjacent, Building, Room, RoomGraph, RoomGraphBuilder, RoomGraphStats, RoomRect, UnionFind};
pub use spatial::SpatialRectIndex;
