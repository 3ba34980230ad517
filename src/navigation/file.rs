use tracing::debug;

use super::chunk::IsoChunk256;
use crate::codec::{encode_chunk_data, CellGeometry, CellPosition, ChunkRecord, Rect};
use crate::generation::Grid;
use crate::tiles::TileIndex;

/// Navigation data of one cell, written as `chunkdata_<cx>_<cy>.bin`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDataFile256 {
    pub version: i16,
    /// x outer, y inner
    pub chunks: Vec<ChunkRecord>,
}

impl ChunkDataFile256 {
    pub fn build(grid: &Grid, tiles: &TileIndex, geometry: &CellGeometry, cell: CellPosition, version: i16) -> Self {
        let rect = geometry.cell_rect(cell);
        let n = geometry.chunks_per_cell();
        let size = geometry.chunk_size;
        let mut chunks = Vec::with_capacity((n * n) as usize);
        for cx in 0..n {
            for cy in 0..n {
                let area = Rect::new(rect.x + cx * size, rect.y + cy * size, size, size);
                chunks.push(IsoChunk256::build(grid, tiles, area).to_record());
            }
        }
        let regular = chunks.iter().filter(|c| matches!(c, ChunkRecord::Regular(_))).count();
        debug!(cell = %cell, chunks = chunks.len(), regular, "built chunk data");
        Self { version, chunks }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        encode_chunk_data(self.version, &self.chunks)
    }

    pub fn file_name(cell: CellPosition) -> String {
        format!("chunkdata_{}_{}.bin", cell.x, cell.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_chunk_data, ChunkClass, CHUNKDATA_VERSION};
    use crate::generation::Entry;
    use crate::tiles::{TileDefinitions, TileFlags};
    use crate::world::map::testing::tileset;

    #[test]
    fn test_build_and_decode() {
        let mut defs = TileDefinitions::new();
        defs.set("water", 0, TileFlags::WATER, -1);
        defs.set("floors", 0, TileFlags::FLOOR, -1);
        let mut tiles = TileIndex::new();
        let water = tiles.assign_first_gid(&tileset("water", 1, 1), &defs).unwrap();
        let floor = tiles.assign_first_gid(&tileset("floors", 2, 1), &defs).unwrap();

        let geometry = CellGeometry::cell256();
        let cell = CellPosition::new(1, 0);
        let mut grid = Grid::new(geometry.cell_rect(cell).inflated(2), 0, 0);
        // chunk (0,0) all water
        for x in 256..264 {
            for y in 0..8 {
                grid.square_mut(x, y, 0).entries.push(Entry { gid: water });
            }
        }
        // chunk (0,1) gets a single floor square
        grid.square_mut(259, 12, 0).entries.push(Entry { gid: floor });

        let file = ChunkDataFile256::build(&grid, &tiles, &geometry, cell, CHUNKDATA_VERSION);
        assert_eq!(file.chunks.len(), 32 * 32);
        assert_eq!(file.chunks[0], ChunkRecord::Uniform(ChunkClass::Water));
        let ChunkRecord::Regular(bits) = &file.chunks[1] else {
            panic!("chunk (0,1) should be regular");
        };
        assert_eq!(bits[3 * 8 + 4], 0);
        assert_eq!(bits[0], 32);
        assert_eq!(file.chunks[32], ChunkRecord::Uniform(ChunkClass::Null));

        let bytes = file.to_bytes();
        let decoded = decode_chunk_data(&bytes, 32 * 32, 64).unwrap();
        assert_eq!(decoded, (CHUNKDATA_VERSION, file.chunks.clone()));
        assert_eq!(ChunkDataFile256::file_name(cell), "chunkdata_1_0.bin");
    }
}
