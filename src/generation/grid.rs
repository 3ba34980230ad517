use crate::codec::Rect;

/// One stacked tile reference, by global id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub gid: u32,
}

/// Tiles stacked at one `(x, y, level)`, bottom to top, and the room there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Square {
    pub entries: Vec<Entry>,
    pub room_id: i32,
}

impl Square {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Square {
    fn default() -> Self {
        Self { entries: Vec::new(), room_id: -1 }
    }
}

/// Dense square grid over a world area and a level range.
///
/// Squares live in one buffer indexed `x + y * W + z * W * H`, all
/// coordinates relative to the area's corner and the lowest level.
#[derive(Debug, Clone)]
pub struct Grid {
    area: Rect,
    min_level: i32,
    max_level: i32,
    squares: Vec<Square>,
}

impl Grid {
    pub fn new(area: Rect, min_level: i32, max_level: i32) -> Self {
        assert!(!area.is_empty(), "empty grid area");
        assert!(min_level <= max_level, "level range {}..={}", min_level, max_level);
        let levels = (max_level - min_level + 1) as usize;
        let len = area.width as usize * area.height as usize * levels;
        Self {
            area,
            min_level,
            max_level,
            squares: vec![Square::default(); len],
        }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn min_level(&self) -> i32 {
        self.min_level
    }

    pub fn max_level(&self) -> i32 {
        self.max_level
    }

    pub fn levels(&self) -> std::ops::RangeInclusive<i32> {
        self.min_level..=self.max_level
    }

    pub fn contains(&self, x: i32, y: i32, level: i32) -> bool {
        self.area.contains(x, y) && level >= self.min_level && level <= self.max_level
    }

    fn index(&self, x: i32, y: i32, level: i32) -> usize {
        let w = self.area.width as usize;
        let h = self.area.height as usize;
        let lx = (x - self.area.x) as usize;
        let ly = (y - self.area.y) as usize;
        let lz = (level - self.min_level) as usize;
        lx + ly * w + lz * w * h
    }

    pub fn get(&self, x: i32, y: i32, level: i32) -> Option<&Square> {
        if !self.contains(x, y, level) {
            return None;
        }
        Some(&self.squares[self.index(x, y, level)])
    }

    pub fn get_mut(&mut self, x: i32, y: i32, level: i32) -> Option<&mut Square> {
        if !self.contains(x, y, level) {
            return None;
        }
        let i = self.index(x, y, level);
        Some(&mut self.squares[i])
    }

    /// Square at a world position inside the grid. Panics outside it.
    pub fn square(&self, x: i32, y: i32, level: i32) -> &Square {
        assert!(self.contains(x, y, level), "square {},{},{} outside grid", x, y, level);
        &self.squares[self.index(x, y, level)]
    }

    pub fn square_mut(&mut self, x: i32, y: i32, level: i32) -> &mut Square {
        assert!(self.contains(x, y, level), "square {},{},{} outside grid", x, y, level);
        let i = self.index(x, y, level);
        &mut self.squares[i]
    }

    /// True if any level has a tile at `(x, y)`
    pub fn has_any_tile(&self, x: i32, y: i32) -> bool {
        self.levels().any(|z| self.get(x, y, z).is_some_and(|s| !s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_indexing() {
        let mut grid = Grid::new(Rect::new(254, 510, 4, 3), -1, 1);
        grid.square_mut(257, 512, 1).entries.push(Entry { gid: 9 });
        grid.square_mut(254, 510, -1).room_id = 3;

        assert_eq!(grid.square(257, 512, 1).entries, vec![Entry { gid: 9 }]);
        assert!(grid.square(257, 512, 0).is_empty());
        assert_eq!(grid.square(254, 510, -1).room_id, 3);
        assert!(grid.get(258, 512, 0).is_none());
        assert!(grid.get(254, 510, 2).is_none());
        assert!(grid.has_any_tile(257, 512));
        assert!(!grid.has_any_tile(256, 512));
    }

    #[test]
    #[should_panic(expected = "outside grid")]
    fn test_out_of_grid_panics() {
        let grid = Grid::new(Rect::new(0, 0, 2, 2), 0, 0);
        grid.square(2, 0, 0);
    }
}
