use std::sync::Arc;

use super::map::{CellRef, Orientation, TileMap, Tileset};

/// A map placed inside a composite at a square offset and level offset.
#[derive(Debug, Clone)]
pub struct Placement {
    pub map: Arc<TileMap>,
    pub x: i32,
    pub y: i32,
    pub level: i32,
}

/// Stack of maps drawn on top of each other. Placements added later render
/// above earlier ones; inside one map, layers render in file order.
#[derive(Debug, Clone)]
pub struct MapComposite {
    width: i32,
    height: i32,
    orientation: Orientation,
    placements: Vec<Placement>,
}

impl MapComposite {
    pub fn new(width: i32, height: i32, orientation: Orientation) -> Self {
        Self {
            width,
            height,
            orientation,
            placements: Vec::new(),
        }
    }

    pub fn from_base(map: Arc<TileMap>) -> Self {
        let mut composite = Self::new(map.width, map.height, map.orientation);
        composite.add_sub_map(map, (0, 0), 0);
        composite
    }

    pub fn add_sub_map(&mut self, map: Arc<TileMap>, offset: (i32, i32), level: i32) {
        self.placements.push(Placement { map, x: offset.0, y: offset.1, level });
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Source cells take the orientation of their first base map
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Visit the tiles rendered at `(x, y)` on `level`, bottom to top.
    pub fn for_each_cell_at<'a>(&'a self, level: i32, x: i32, y: i32, mut f: impl FnMut(CellRef<'a>)) {
        for p in &self.placements {
            let lx = x - p.x;
            let ly = y - p.y;
            if !p.map.contains(lx, ly) {
                continue;
            }
            let lz = level - p.level;
            for layer in p.map.layers.iter().filter(|l| l.level == lz) {
                if let Some(cell) = p.map.cell_at(layer, lx, ly) {
                    f(cell);
                }
            }
        }
    }

    pub fn ordered_cells_at(&self, level: i32, x: i32, y: i32) -> Vec<CellRef<'_>> {
        let mut cells = Vec::new();
        self.for_each_cell_at(level, x, y, |c| cells.push(c));
        cells
    }

    /// Lowest and highest level any placement draws on; `(0, 0)` when empty.
    pub fn level_range(&self) -> (i32, i32) {
        self.placements
            .iter()
            .filter_map(|p| p.map.level_range().map(|(lo, hi)| (lo + p.level, hi + p.level)))
            .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))
            .unwrap_or((0, 0))
    }

    /// Every tileset of every placement, in placement order. Shared tilesets repeat.
    pub fn tilesets(&self) -> impl Iterator<Item = &Tileset> {
        self.placements.iter().flat_map(|p| p.map.tilesets.iter())
    }
}
