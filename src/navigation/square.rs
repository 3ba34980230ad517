use bitflags::bitflags;

use crate::generation::Grid;
use crate::tiles::{TileFlags, TileIndex};

bitflags! {
    /// Per-square navigation bits as stored in chunkdata
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SquareBits: u8 {
        const SOLID = 1;
        const WALL_N = 2;
        const WALL_W = 4;
        const WATER = 8;
        const ROOM = 16;
        /// No tile on any level
        const NULL = 32;
    }
}

/// Ground-floor square as seen by the runtime's path finder.
pub struct IsoGridSquare256;

impl IsoGridSquare256 {
    pub fn classify(grid: &Grid, tiles: &TileIndex, x: i32, y: i32) -> SquareBits {
        if !grid.has_any_tile(x, y) {
            return SquareBits::NULL;
        }
        let Some(square) = grid.get(x, y, 0) else { return SquareBits::empty() };
        let flags = square
            .entries
            .iter()
            .fold(TileFlags::empty(), |acc, e| acc | tiles.flags(e.gid));
        Self::from_tile_flags(flags, square.room_id >= 0)
    }

    pub fn from_tile_flags(flags: TileFlags, in_room: bool) -> SquareBits {
        let mut bits = SquareBits::empty();
        if flags.is_solid() {
            bits |= SquareBits::SOLID;
        }
        if flags.blocks_north() && !flags.contains(TileFlags::HOPPABLE_N) {
            bits |= SquareBits::WALL_N;
        }
        if flags.blocks_west() && !flags.contains(TileFlags::HOPPABLE_W) {
            bits |= SquareBits::WALL_W;
        }
        if flags.contains(TileFlags::WATER) {
            bits |= SquareBits::WATER;
        }
        if in_room {
            bits |= SquareBits::ROOM;
        }
        bits
    }
}
