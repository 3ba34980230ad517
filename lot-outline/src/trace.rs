//! Boundary edge following.
//!
//! Every occupied cell contributes one directed edge per side that borders an
//! empty cell, oriented so the occupied cell lies on the right of the edge
//! (y grows downwards). Following those edges, and turning right whenever a
//! vertex offers a choice, yields closed rings: clockwise outer boundaries
//! and counter-clockwise holes. Cells that only touch diagonally end up in
//! separate rings.

use crate::{BitGrid, Point, Ring};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    East,
    South,
    West,
    North,
}

impl Dir {
    fn right(self) -> Self {
        match self {
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
            Self::North => Self::East,
        }
    }

    fn left(self) -> Self {
        match self {
            Self::East => Self::North,
            Self::South => Self::East,
            Self::West => Self::South,
            Self::North => Self::West,
        }
    }

    fn step(self, (x, y): Point) -> Point {
        match self {
            Self::East => (x + 1, y),
            Self::South => (x, y + 1),
            Self::West => (x - 1, y),
            Self::North => (x, y - 1),
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::East => 1,
            Self::South => 2,
            Self::West => 4,
            Self::North => 8,
        }
    }
}

/// Owning cell of the edge that leaves `vertex` heading `dir`.
fn edge_cell((vx, vy): Point, dir: Dir) -> Point {
    match dir {
        // north side of the cell below-right of the vertex
        Dir::East => (vx, vy),
        // east side of the cell below-left
        Dir::South => (vx - 1, vy),
        // south side of the cell above-left
        Dir::West => (vx - 1, vy - 1),
        // west side of the cell above-right
        Dir::North => (vx, vy - 1),
    }
}

/// Neighbour across the side an edge runs along.
fn outside_cell((cx, cy): Point, dir: Dir) -> Point {
    match dir {
        Dir::East => (cx, cy - 1),
        Dir::South => (cx + 1, cy),
        Dir::West => (cx, cy + 1),
        Dir::North => (cx - 1, cy),
    }
}

struct EdgeSet<'a> {
    grid: &'a BitGrid,
    visited: Vec<u8>,
}

impl<'a> EdgeSet<'a> {
    fn new(grid: &'a BitGrid) -> Self {
        Self {
            grid,
            visited: vec![0; grid.width() * grid.height()],
        }
    }

    fn exists(&self, vertex: Point, dir: Dir) -> bool {
        let cell = edge_cell(vertex, dir);
        let (ox, oy) = outside_cell(cell, dir);
        self.grid.get(cell.0, cell.1) && !self.grid.get(ox, oy)
    }

    fn is_visited(&self, vertex: Point, dir: Dir) -> bool {
        let (cx, cy) = edge_cell(vertex, dir);
        self.visited[cy as usize * self.grid.width() + cx as usize] & dir.bit() != 0
    }

    fn visit(&mut self, vertex: Point, dir: Dir) {
        let (cx, cy) = edge_cell(vertex, dir);
        self.visited[cy as usize * self.grid.width() + cx as usize] |= dir.bit();
    }

    fn next_dir(&self, vertex: Point, incoming: Dir) -> Option<Dir> {
        [incoming.right(), incoming, incoming.left()]
            .into_iter()
            .find(|&d| self.exists(vertex, d))
    }
}

/// Trace every boundary of the occupied cells of `grid`.
///
/// Rings start at the top-left corner of the first unvisited north edge in
/// row-major order, so the first vertex of each ring is always a corner.
/// Consecutive colinear boundary steps are collapsed into single segments.
pub fn trace_outlines(grid: &BitGrid) -> Vec<Ring> {
    let mut edges = EdgeSet::new(grid);
    let mut rings = Vec::new();

    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            let start = (x, y);
            if !edges.exists(start, Dir::East) || edges.is_visited(start, Dir::East) {
                continue;
            }
            rings.push(follow(&mut edges, start));
        }
    }

    rings
}

fn follow(edges: &mut EdgeSet, start: Point) -> Ring {
    let mut ring = vec![start];
    edges.visit(start, Dir::East);
    let mut dir = Dir::East;
    let mut vertex = Dir::East.step(start);

    loop {
        let Some(next) = edges.next_dir(vertex, dir) else {
            debug_assert!(false, "open boundary at {vertex:?}");
            break;
        };
        if vertex == start && next == Dir::East {
            break;
        }
        debug_assert!(!edges.is_visited(vertex, next), "edge revisited at {vertex:?}");
        // straight steps extend the current run
        if next != dir {
            ring.push(vertex);
        }
        edges.visit(vertex, next);
        dir = next;
        vertex = dir.step(vertex);
    }

    ring
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_block() {
        let mut grid = BitGrid::new(10, 10);
        grid.fill_rect(2, 2, 3, 3);
        let rings = trace_outlines(&grid);
        assert_eq!(rings, vec![vec![(2, 2), (5, 2), (5, 5), (2, 5)]]);
    }

    #[test]
    fn test_hole_gives_second_ring() {
        let mut grid = BitGrid::new(5, 5);
        grid.fill_rect(0, 0, 5, 5);
        grid.set(2, 2, false);
        let rings = trace_outlines(&grid);
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0], vec![(0, 0), (5, 0), (5, 5), (0, 5)]);
        // hole runs counter-clockwise around the empty cell
        assert_eq!(rings[1], vec![(2, 3), (3, 3), (3, 2), (2, 2)]);
    }

    #[test]
    fn test_diagonal_cells_stay_separate() {
        let mut grid = BitGrid::new(3, 3);
        grid.set(0, 0, true);
        grid.set(1, 1, true);
        let rings = trace_outlines(&grid);
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0], vec![(0, 0), (1, 0), (1, 1), (0, 1)]);
        assert_eq!(rings[1], vec![(1, 1), (2, 1), (2, 2), (1, 2)]);
    }

    #[test]
    fn test_l_shape() {
        let mut grid = BitGrid::new(4, 4);
        grid.fill_rect(0, 0, 1, 3);
        grid.fill_rect(0, 2, 3, 1);
        let rings = trace_outlines(&grid);
        assert_eq!(rings, vec![vec![(0, 0), (1, 0), (1, 2), (3, 2), (3, 3), (0, 3)]]);
    }

    #[test]
    fn test_empty_grid() {
        assert!(trace_outlines(&BitGrid::new(3, 3)).is_empty());
    }
}
