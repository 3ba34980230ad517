//! Outline tracing for occupancy grids
//!
//! Architecture:
//! 1. `grid` - Bounded boolean occupancy grid
//! 2. `trace` - Follows boundary edges into closed rings (outer rings and holes)
//! 3. `simplify` - Douglas-Peucker reduction that keeps border-aligned vertices
//!
//! Used by the lot exporter's world map feature pass, which turns water and
//! building footprints of a cell into polygons.

mod grid;
mod trace;
mod simplify;

pub use grid::BitGrid;
pub use trace::trace_outlines;
pub use simplify::{simplify_ring, merge_colinear, SimplifyOptions};

/// Grid corner coordinate. A cell `(x, y)` spans corners `(x, y)..(x + 1, y + 1)`.
pub type Point = (i32, i32);

/// Closed polygon; the first point is not repeated at the end.
pub type Ring = Vec<Point>;

/// Trace and simplify every outline of `grid` in one call.
pub fn outlines(grid: &BitGrid, options: &SimplifyOptions) -> Vec<Ring> {
    trace_outlines(grid)
        .iter()
        .map(|ring| simplify_ring(ring, options))
        .filter(|ring| ring.len() >= 3)
        .collect()
}

/// Twice the signed area of `ring`. Positive for clockwise outer rings
/// (y grows downwards), negative for holes.
pub fn signed_area2(ring: &[Point]) -> i64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (x0, y0) = ring[i];
            let (x1, y1) = ring[(i + 1) % n];
            x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64
        })
        .sum()
}
