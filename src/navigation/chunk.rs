use super::square::{IsoGridSquare256, SquareBits};
use crate::codec::{ChunkClass, ChunkRecord, Rect};
use crate::generation::Grid;
use crate::tiles::TileIndex;

/// Navigation bits of one chunk's squares, x outer, y inner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoChunk256 {
    pub bits: Vec<SquareBits>,
}

impl IsoChunk256 {
    /// Classify the squares of `area`, one chunk of the cell.
    pub fn build(grid: &Grid, tiles: &TileIndex, area: Rect) -> Self {
        let mut bits = Vec::with_capacity((area.width * area.height) as usize);
        for x in area.x..area.right() {
            for y in area.y..area.bottom() {
                bits.push(IsoGridSquare256::classify(grid, tiles, x, y));
            }
        }
        Self { bits }
    }

    /// Class shared by every square, if the squares agree on one that has a class.
    pub fn uniform_class(&self) -> Option<ChunkClass> {
        let first = *self.bits.first()?;
        if self.bits.iter().any(|&b| b != first) {
            return None;
        }
        let class = if first.is_empty() {
            ChunkClass::Empty
        } else if first == SquareBits::SOLID {
            ChunkClass::Solid
        } else if first == SquareBits::WATER {
            ChunkClass::Water
        } else if first == SquareBits::ROOM {
            ChunkClass::Room
        } else if first == SquareBits::NULL {
            ChunkClass::Null
        } else {
            return None;
        };
        Some(class)
    }

    pub fn to_record(&self) -> ChunkRecord {
        match self.uniform_class() {
            Some(class) => ChunkRecord::Uniform(class),
            None => ChunkRecord::Regular(self.bits.iter().map(|b| b.bits()).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(bits: Vec<SquareBits>) -> IsoChunk256 {
        IsoChunk256 { bits }
    }

    #[test]
    fn test_uniform_classes() {
        assert_eq!(chunk(vec![SquareBits::NULL; 64]).uniform_class(), Some(ChunkClass::Null));
        assert_eq!(chunk(vec![SquareBits::empty(); 64]).uniform_class(), Some(ChunkClass::Empty));
        assert_eq!(chunk(vec![SquareBits::ROOM; 64]).to_record(), ChunkRecord::Uniform(ChunkClass::Room));
        // uniform, but not a class of its own
        let walls = chunk(vec![SquareBits::ROOM | SquareBits::WALL_N; 64]);
        assert_eq!(walls.uniform_class(), None);
        assert_eq!(walls.to_record(), ChunkRecord::Regular(vec![18; 64]));
    }

    #[test]
    fn test_mixed_chunk_is_regular() {
        let mut bits = vec![SquareBits::SOLID; 64];
        bits[9] = SquareBits::WATER;
        let ChunkRecord::Regular(bytes) = chunk(bits).to_record() else {
            panic!("expected a regular chunk");
        };
        assert_eq!(bytes.len(), 64);
        assert_eq!(bytes[8], 1);
        assert_eq!(bytes[9], 8);
    }

    #[test]
    fn test_build_order_is_x_outer() {
        use crate::generation::Entry;
        let tiles = TileIndex::new();
        let mut grid = Grid::new(Rect::new(0, 0, 8, 8), 0, 0);
        // gid 0 flags are empty, so only the NULL bit changes
        grid.square_mut(0, 1, 0).entries.push(Entry { gid: 0 });
        let chunk = IsoChunk256::build(&grid, &tiles, Rect::new(0, 0, 8, 8));
        assert_eq!(chunk.bits[0], SquareBits::NULL);
        assert_eq!(chunk.bits[1], SquareBits::empty());
        assert_eq!(chunk.bits[8], SquareBits::NULL);
    }
}
