use tracing::warn;

use super::combined::CombinedCellMaps;
use super::grid::{Entry, Grid};
use crate::rooms::{RoomGraph, ISO_LEVEL_SKEW};
use crate::tiles::{TileIndex, NO_TILE};
use crate::world::Orientation;

/// Squares kept around the cell so neighbourhood tests see the tiles just outside it
pub const GRID_PADDING: i32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeStats {
    pub entries: usize,
    /// Rendered tiles whose tileset has no gid range
    pub missing_tiles: usize,
}

/// Fills a cell's grid from its combined maps.
pub struct GridCompositor<'a> {
    combined: &'a CombinedCellMaps,
}

impl<'a> GridCompositor<'a> {
    pub fn new(combined: &'a CombinedCellMaps) -> Self {
        Self { combined }
    }

    /// Collect the tile stack of every square of the padded cell area.
    /// Only tiles inside the cell itself are marked used.
    pub fn fill(&self, tiles: &mut TileIndex) -> (Grid, CompositeStats) {
        let composite = self.combined.composite();
        let cell = self.combined.cell_rect();
        let (lo, hi) = composite.level_range();
        let mut grid = Grid::new(cell.inflated(GRID_PADDING), lo.min(0), hi.max(0));
        let mut stats = CompositeStats::default();
        let area = grid.area();
        let skew_per_level = match composite.orientation() {
            Orientation::Isometric => ISO_LEVEL_SKEW,
            _ => 0,
        };

        for z in grid.levels() {
            let skew = skew_per_level * z;
            for y in area.y..area.bottom() {
                for x in area.x..area.right() {
                    let (mx, my) = self.combined.to_combined(x, y);
                    let inside = cell.contains(x, y);
                    let square = grid.square_mut(x, y, z);
                    composite.for_each_cell_at(z, mx + skew, my + skew, |c| {
                        let gid = tiles.gid_for(&c);
                        if gid == NO_TILE {
                            stats.missing_tiles += 1;
                            return;
                        }
                        if inside {
                            tiles.mark_used(gid);
                        }
                        square.entries.push(Entry { gid });
                        stats.entries += 1;
                    });
                }
            }
        }

        if stats.missing_tiles > 0 {
            warn!(cell = %self.combined.cell(), count = stats.missing_tiles, "tiles from unknown tilesets dropped");
        }
        (grid, stats)
    }
}

/// Write each room's id into the squares its rects cover.
pub fn stamp_rooms(grid: &mut Grid, graph: &RoomGraph) {
    for (id, room) in graph.rooms.iter().enumerate() {
        for rr in &room.rects {
            for y in rr.rect.y..rr.rect.bottom() {
                for x in rr.rect.x..rr.rect.right() {
                    if let Some(square) = grid.get_mut(x, y, room.level) {
                        square.room_id = id as i32;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CellGeometry, CellPosition, Rect};
    use crate::rooms::{RoomGraphBuilder, RoomRect};
    use crate::tiles::TileDefinitions;
    use crate::world::map::testing::*;
    use crate::world::{MemoryMapLoader, ObjectGroup, WorldCell, WorldLot, WorldSpec};

    fn single_cell(map: crate::world::TileMap) -> CombinedCellMaps {
        let mut loader = MemoryMapLoader::new();
        loader.insert("cell.json", map);
        let world = WorldSpec {
            width: 1,
            height: 1,
            cells: vec![WorldCell { x: 0, y: 0, map: Some("cell.json".into()), lots: vec![], objects: vec![] }],
        };
        CombinedCellMaps::load(&world, &mut loader, CellGeometry::cell256(), CellPosition::new(0, 0), 0).unwrap()
    }

    fn index_for(combined: &CombinedCellMaps) -> TileIndex {
        let defs = TileDefinitions::new();
        let mut tiles = TileIndex::new();
        for ts in combined.composite().tilesets() {
            tiles.assign_first_gid(ts, &defs).unwrap();
        }
        tiles
    }

    #[test]
    fn test_fill_marks_only_cell_tiles_used() {
        let mut map = blank_map("cell.json", 300, 300, vec![tileset("floors", 1, 16)]);
        map.layers.push(layer(&map, "0_Floor", 0, &[(10, 10, 3), (257, 10, 5)]));
        map.layers.push(layer(&map, "0_Furniture", 0, &[(10, 10, 4)]));
        let combined = single_cell(map);
        let mut tiles = index_for(&combined);

        let (grid, stats) = GridCompositor::new(&combined).fill(&mut tiles);
        assert_eq!(grid.area(), Rect::new(-2, -2, 260, 260));
        let gids: Vec<u32> = grid.square(10, 10, 0).entries.iter().map(|e| e.gid).collect();
        assert_eq!(gids, vec![3, 4]);
        // 257 is in the padding: present in the grid but not used
        assert_eq!(grid.square(257, 10, 0).entries.len(), 1);
        assert_eq!(stats.entries, 3);
        assert_eq!(tiles.used_count(), 2);
        assert!(!tiles.tile(5).used);
    }

    #[test]
    fn test_isometric_skew() {
        let mut map = blank_map("cell.json", 300, 300, vec![tileset("walls", 1, 16)]);
        map.orientation = Orientation::Isometric;
        map.layers.push(layer(&map, "1_Walls", 1, &[(13, 13, 2)]));
        let combined = single_cell(map);
        let mut tiles = index_for(&combined);

        let (grid, _) = GridCompositor::new(&combined).fill(&mut tiles);
        assert_eq!(grid.levels(), 0..=1);
        assert_eq!(grid.square(10, 10, 1).entries, vec![Entry { gid: 2 }]);
        assert!(grid.square(13, 13, 1).is_empty());
    }

    #[test]
    fn test_level_isometric_has_no_skew() {
        let mut map = blank_map("cell.json", 300, 300, vec![tileset("walls", 1, 16)]);
        map.layers.push(layer(&map, "1_Walls", 1, &[(13, 13, 2)]));
        let combined = single_cell(map);
        let mut tiles = index_for(&combined);
        let (grid, _) = GridCompositor::new(&combined).fill(&mut tiles);
        assert_eq!(grid.square(13, 13, 1).entries.len(), 1);
    }

    #[test]
    fn test_unknown_tileset_counts_missing() {
        let mut map = blank_map("cell.json", 300, 300, vec![tileset("walls", 1, 16)]);
        map.layers.push(layer(&map, "0_Walls", 0, &[(1, 1, 2)]));
        let combined = single_cell(map);
        let mut tiles = TileIndex::new();
        let (grid, stats) = GridCompositor::new(&combined).fill(&mut tiles);
        assert!(grid.square(1, 1, 0).is_empty());
        assert_eq!(stats.missing_tiles, 1);
    }

    #[test]
    fn test_stamp_rooms() {
        let mut builder = RoomGraphBuilder::new(Rect::new(0, 0, 300, 300), 16);
        builder.add_rect(RoomRect::new("kitchen", 0, Rect::new(4, 4, 2, 2), "cell.json"));
        builder.add_rect(RoomRect::new("attic", 1, Rect::new(4, 4, 1, 1), "cell.json"));
        let graph = builder.build();
        let mut grid = Grid::new(Rect::new(0, 0, 10, 10), 0, 1);
        stamp_rooms(&mut grid, &graph);
        assert_eq!(grid.square(5, 5, 0).room_id, 0);
        assert_eq!(grid.square(6, 5, 0).room_id, -1);
        assert_eq!(grid.square(4, 4, 1).room_id, 1);
        assert_eq!(grid.square(5, 5, 1).room_id, -1);
    }

    #[test]
    fn test_isometric_lot_room_covers_its_tiles() {
        let mut base = blank_map("cell.json", 300, 300, vec![]);
        base.orientation = Orientation::Isometric;
        let mut house = blank_map("house.json", 8, 8, vec![tileset("floors", 1, 4)]);
        house.orientation = Orientation::Isometric;
        house.layers.push(layer(&house, "0_Floor", 0, &[(1, 1, 1)]));
        house.object_groups.push(ObjectGroup { name: "0_RoomDefs".into(), level: 0, objects: vec![room_def("hall", 1, 1, 1, 1)] });
        let mut loader = MemoryMapLoader::new();
        loader.insert("cell.json", base);
        loader.insert("house.json", house);
        let world = WorldSpec {
            width: 1,
            height: 1,
            cells: vec![WorldCell {
                x: 0,
                y: 0,
                map: Some("cell.json".into()),
                lots: vec![WorldLot { map: "house.json".into(), x: 20, y: 20, level: 1 }],
                objects: vec![],
            }],
        };
        let combined = CombinedCellMaps::load(&world, &mut loader, CellGeometry::cell256(), CellPosition::new(0, 0), 0).unwrap();
        let mut tiles = index_for(&combined);
        let mut builder = RoomGraphBuilder::new(combined.combined_rect(), 16);
        builder.extend(combined.room_rects().iter().cloned());
        let graph = builder.build();

        let (mut grid, _) = GridCompositor::new(&combined).fill(&mut tiles);
        stamp_rooms(&mut grid, &graph);
        // the lot's (1,1) at level 1 lands on (21,21) - 3
        let square = grid.square(18, 18, 1);
        assert_eq!(square.entries.len(), 1);
        assert_eq!(square.room_id, 0);
        assert_eq!(grid.square(21, 21, 1).room_id, -1);
    }
}
