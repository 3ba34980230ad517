use serde::{Deserialize, Serialize};

/// Output cell coordinates (a cell is `CellGeometry::cell_size` squares on a side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CellPosition {
    pub x: i32,
    pub y: i32,
}

impl CellPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for CellPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Chunk coordinates local to one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkPosition {
    pub x: i32,
    pub y: i32,
}

impl ChunkPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Integer rectangle covering squares `[x, x + width) x [y, y + height)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Area overlap; rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn inflated(&self, by: i32) -> Rect {
        Rect::new(self.x - by, self.y - by, self.width + 2 * by, self.height + 2 * by)
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Bounding box of both rectangles
    pub fn united(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }
}

/// Cell and chunk sizes the whole pipeline derives its coordinates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellGeometry {
    /// Squares per output cell side
    pub cell_size: i32,
    /// Squares per output chunk side
    pub chunk_size: i32,
    /// Squares per authored source cell side
    pub source_cell_size: i32,
    /// Chunk size of the legacy format, used to index the zombie density map
    pub legacy_chunk_size: i32,
}

impl CellGeometry {
    pub const fn cell256() -> Self {
        Self {
            cell_size: 256,
            chunk_size: 8,
            source_cell_size: 300,
            legacy_chunk_size: 10,
        }
    }

    pub const fn legacy300() -> Self {
        Self {
            cell_size: 300,
            chunk_size: 10,
            source_cell_size: 300,
            legacy_chunk_size: 10,
        }
    }

    pub fn chunks_per_cell(&self) -> i32 {
        self.cell_size / self.chunk_size
    }

    pub fn squares_per_chunk(&self) -> usize {
        (self.chunk_size * self.chunk_size) as usize
    }

    /// World-square rectangle covered by an output cell
    pub fn cell_rect(&self, cell: CellPosition) -> Rect {
        Rect::new(
            cell.x * self.cell_size,
            cell.y * self.cell_size,
            self.cell_size,
            self.cell_size,
        )
    }

    /// Output cells overlapping one source cell, inclusive range per axis
    pub fn cells_for_source(&self, sx: i32, sy: i32) -> (CellPosition, CellPosition) {
        let s = self.source_cell_size;
        let c = self.cell_size;
        (
            CellPosition::new((sx * s).div_euclid(c), (sy * s).div_euclid(c)),
            CellPosition::new((sx * s + s - 1).div_euclid(c), (sy * s + s - 1).div_euclid(c)),
        )
    }

    /// Source cells overlapping one output cell, inclusive range per axis
    pub fn sources_for_cell(&self, cell: CellPosition) -> ((i32, i32), (i32, i32)) {
        self.sources_for_rect(&self.cell_rect(cell))
    }

    /// Source cells overlapping a world-square rectangle, inclusive range per axis
    pub fn sources_for_rect(&self, rect: &Rect) -> ((i32, i32), (i32, i32)) {
        let s = self.source_cell_size;
        (
            (rect.x.div_euclid(s), rect.y.div_euclid(s)),
            ((rect.right() - 1).div_euclid(s), (rect.bottom() - 1).div_euclid(s)),
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cell_size <= 0 || self.chunk_size <= 0 || self.source_cell_size <= 0 {
            return Err("cell, chunk and source cell sizes must be positive".into());
        }
        if self.cell_size % self.chunk_size != 0 {
            return Err(format!(
                "cell size {} is not a multiple of chunk size {}",
                self.cell_size, self.chunk_size
            ));
        }
        if self.legacy_chunk_size <= 0 {
            return Err("legacy chunk size must be positive".into());
        }
        Ok(())
    }
}

impl Default for CellGeometry {
    fn default() -> Self {
        Self::cell256()
    }
}
