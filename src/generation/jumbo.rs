//! Jumbo tree densification.
//!
//! Inside forest-like zones, a fraction of ordinary trees on level 0 is
//! replaced by one wide jumbo tree tile, and the trees right next to it are
//! removed. Trees near buildings, fences, upper floors or the north/west
//! cell edges are left alone.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::combined::PlacedObject;
use super::grid::{Entry, Grid};
use crate::codec::Rect;
use crate::tiles::{TileFlags, TileIndex};

/// Object property overriding the zone's density, 0..=100
pub const DENSITY_PROPERTY: &str = "JumboTreeDensity";

/// Squares along the north and west cell edges that never get jumbo trees
pub const EDGE_MARGIN: i32 = 4;

/// Zone type and the chance, in percent, a tree inside it becomes a jumbo tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumboZone {
    pub name: String,
    pub density: u8,
}

impl JumboZone {
    pub fn new(name: impl Into<String>, density: u8) -> Self {
        Self { name: name.into(), density: density.min(100) }
    }

    pub fn defaults() -> Vec<JumboZone> {
        vec![
            JumboZone::new("DeepForest", 100),
            JumboZone::new("Farm", 5),
            JumboZone::new("FarmLand", 5),
            JumboZone::new("Forest", 50),
            JumboZone::new("TownZone", 5),
            JumboZone::new("Vegitation", 10),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Prevent,
    Zone,
    Jumbo,
    RemoveTree,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JumboStats {
    pub trees: usize,
    pub promoted: usize,
    pub removed: usize,
}

pub struct JumboTreeDensifier<'a> {
    zones: &'a [JumboZone],
    jumbo_first_gid: u32,
    jumbo_tiles: u32,
    rng: StdRng,
}

impl<'a> JumboTreeDensifier<'a> {
    /// `seed: None` draws from entropy, so placement differs between runs.
    pub fn new(zones: &'a [JumboZone], jumbo_first_gid: u32, jumbo_tiles: u32, seed: Option<u64>) -> Self {
        assert!(jumbo_tiles > 0, "jumbo tileset has no tiles");
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { zones, jumbo_first_gid, jumbo_tiles, rng }
    }

    pub fn apply(
        &mut self,
        grid: &mut Grid,
        tiles: &mut TileIndex,
        objects: &[PlacedObject],
        cell: Rect,
    ) -> JumboStats {
        let size = cell.width as usize * cell.height as usize;
        let mut placement = vec![Placement::Prevent; size];
        let mut density = vec![0u8; size];
        let at = |x: i32, y: i32| (x - cell.x) as usize + (y - cell.y) as usize * cell.width as usize;

        for obj in objects.iter().filter(|o| o.level == 0) {
            let Some(zone) = self.zones.iter().find(|z| z.name == obj.kind) else { continue };
            let d = obj
                .properties
                .get(DENSITY_PROPERTY)
                .and_then(|v| v.trim().parse::<i32>().ok())
                .map(|v| v.clamp(0, 100) as u8)
                .unwrap_or(zone.density);
            for (x, y) in clipped(&obj.rect, &cell) {
                placement[at(x, y)] = Placement::Zone;
                density[at(x, y)] = density[at(x, y)].max(d);
            }
        }

        let prevent = |placement: &mut [Placement], around: Rect| {
            for (x, y) in clipped(&around, &cell) {
                placement[at(x, y)] = Placement::Prevent;
            }
        };
        let area = grid.area();
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let upper = grid.get(x, y, 1).is_some_and(|s| !s.is_empty());
                if upper {
                    prevent(&mut placement, Rect::new(x - 2, y - 2, 5, 5));
                    continue;
                }
                let blocking = grid
                    .get(x, y, 0)
                    .is_some_and(|s| s.entries.iter().any(|e| !tiles.flags(e.gid).is_floor_or_vegetation()));
                if blocking {
                    prevent(&mut placement, Rect::new(x - 1, y - 1, 3, 3));
                }
            }
        }
        prevent(&mut placement, Rect::new(cell.x, cell.y, cell.width, EDGE_MARGIN));
        prevent(&mut placement, Rect::new(cell.x, cell.y, EDGE_MARGIN, cell.height));

        let mut trees: Vec<(i32, i32)> = clipped(&cell, &cell)
            .filter(|&(x, y)| first_tree(grid, tiles, x, y).is_some())
            .collect();
        let mut stats = JumboStats { trees: trees.len(), ..JumboStats::default() };

        while !trees.is_empty() {
            let (x, y) = trees.swap_remove(self.rng.gen_range(0..trees.len()));
            let i = at(x, y);
            if placement[i] != Placement::Zone || self.rng.gen_range(0..100) >= u32::from(density[i]) {
                continue;
            }
            placement[i] = Placement::Jumbo;
            for (nx, ny) in clipped(&Rect::new(x - 1, y - 1, 3, 3), &cell) {
                if (nx, ny) != (x, y) {
                    placement[at(nx, ny)] = Placement::RemoveTree;
                }
            }
        }

        for (x, y) in clipped(&cell, &cell) {
            let action = placement[at(x, y)];
            if !matches!(action, Placement::Jumbo | Placement::RemoveTree) {
                continue;
            }
            let Some(k) = first_tree(grid, tiles, x, y) else { continue };
            let square = grid.square_mut(x, y, 0);
            if action == Placement::Jumbo {
                let gid = self.jumbo_first_gid + self.rng.gen_range(0..self.jumbo_tiles);
                tiles.mark_used(gid);
                square.entries[k] = Entry { gid };
                stats.promoted += 1;
            } else {
                square.entries.remove(k);
                stats.removed += 1;
            }
        }

        debug!(trees = stats.trees, promoted = stats.promoted, removed = stats.removed, "jumbo trees");
        stats
    }
}

/// Index of the first tree entry on level 0
fn first_tree(grid: &Grid, tiles: &TileIndex, x: i32, y: i32) -> Option<usize> {
    grid.get(x, y, 0)?
        .entries
        .iter()
        .position(|e| tiles.flags(e.gid).contains(TileFlags::TREE))
}

/// Squares of `rect` inside `bounds`, row by row
fn clipped(rect: &Rect, bounds: &Rect) -> impl Iterator<Item = (i32, i32)> {
    let x0 = rect.x.max(bounds.x);
    let x1 = rect.right().min(bounds.right());
    let y0 = rect.y.max(bounds.y);
    let y1 = rect.bottom().min(bounds.bottom());
    (y0..y1.max(y0)).flat_map(move |y| (x0..x1.max(x0)).map(move |x| (x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::TileDefinitions;
    use crate::world::map::testing::tileset;
    use std::collections::BTreeMap;

    const CELL: Rect = Rect::new(0, 0, 32, 32);

    struct Fixture {
        grid: Grid,
        tiles: TileIndex,
        tree: u32,
        grass: u32,
        fence: u32,
        jumbo: u32,
    }

    fn fixture() -> Fixture {
        let mut defs = TileDefinitions::new();
        defs.set("e_trees", 0, TileFlags::TREE, -1);
        defs.set("blends_natural", 0, TileFlags::FLOOR | TileFlags::VEGETATION, -1);
        defs.set("fencing", 0, TileFlags::WALL_W, -1);
        let mut tiles = TileIndex::new();
        let tree = tiles.assign_first_gid(&tileset("e_trees", 1, 1), &defs).unwrap();
        let grass = tiles.assign_first_gid(&tileset("blends_natural", 2, 1), &defs).unwrap();
        let fence = tiles.assign_first_gid(&tileset("fencing", 3, 1), &defs).unwrap();
        let jumbo = tiles.register_image("jumbo_tree_01", 1, &defs);

        let mut grid = Grid::new(CELL.inflated(2), 0, 0);
        for y in 0..32 {
            for x in 0..32 {
                grid.square_mut(x, y, 0).entries.push(Entry { gid: grass });
            }
        }
        Fixture { grid, tiles, tree, grass, fence, jumbo }
    }

    fn forest(density: Option<&str>) -> Vec<PlacedObject> {
        let mut properties = BTreeMap::new();
        if let Some(d) = density {
            properties.insert(DENSITY_PROPERTY.to_string(), d.to_string());
        }
        vec![PlacedObject { kind: "Forest".into(), name: String::new(), rect: CELL, level: 0, properties }]
    }

    fn plant(f: &mut Fixture, x: i32, y: i32) {
        f.grid.square_mut(x, y, 0).entries.push(Entry { gid: f.tree });
    }

    fn gids(f: &Fixture, x: i32, y: i32) -> Vec<u32> {
        f.grid.square(x, y, 0).entries.iter().map(|e| e.gid).collect()
    }

    #[test]
    fn test_full_density_promotes_isolated_tree() {
        let mut f = fixture();
        plant(&mut f, 10, 10);
        let zones = JumboZone::defaults();
        let mut densifier = JumboTreeDensifier::new(&zones, f.jumbo, 1, Some(7));
        let stats = densifier.apply(&mut f.grid, &mut f.tiles, &forest(Some("100")), CELL);
        assert_eq!(stats.promoted, 1);
        assert_eq!(gids(&f, 10, 10), vec![f.grass, f.jumbo]);
        assert!(f.tiles.tile(f.jumbo).used);
    }

    #[test]
    fn test_neighbours_of_jumbo_are_removed() {
        let mut f = fixture();
        for x in 10..13 {
            plant(&mut f, x, 10);
        }
        let zones = JumboZone::defaults();
        let mut densifier = JumboTreeDensifier::new(&zones, f.jumbo, 1, Some(3));
        let stats = densifier.apply(&mut f.grid, &mut f.tiles, &forest(Some("100")), CELL);
        // the first pick wins and clears its neighbours
        assert_eq!(stats.trees, 3);
        assert_eq!(stats.promoted + stats.removed, 3);
        assert!(stats.promoted == 1 || stats.promoted == 2);
        for x in 10..13 {
            assert!(!gids(&f, x, 10).contains(&f.tree));
        }
    }

    #[test]
    fn test_tree_next_to_fence_is_kept() {
        let mut f = fixture();
        plant(&mut f, 10, 10);
        f.grid.square_mut(11, 11, 0).entries.push(Entry { gid: f.fence });
        let zones = JumboZone::defaults();
        let mut densifier = JumboTreeDensifier::new(&zones, f.jumbo, 1, Some(11));
        let stats = densifier.apply(&mut f.grid, &mut f.tiles, &forest(Some("100")), CELL);
        assert_eq!(stats.promoted, 0);
        assert_eq!(gids(&f, 10, 10), vec![f.grass, f.tree]);
    }

    #[test]
    fn test_edge_margin_is_kept() {
        let mut f = fixture();
        plant(&mut f, 3, 20);
        plant(&mut f, 20, 3);
        plant(&mut f, 4, 4);
        let zones = JumboZone::defaults();
        let mut densifier = JumboTreeDensifier::new(&zones, f.jumbo, 1, Some(5));
        let stats = densifier.apply(&mut f.grid, &mut f.tiles, &forest(Some("100")), CELL);
        assert_eq!(stats.promoted, 1);
        assert!(gids(&f, 3, 20).contains(&f.tree));
        assert!(gids(&f, 20, 3).contains(&f.tree));
        assert!(gids(&f, 4, 4).contains(&f.jumbo));
    }

    #[test]
    fn test_upper_floor_prevents() {
        let mut f = fixture();
        f.grid = {
            let mut grid = Grid::new(CELL.inflated(2), 0, 1);
            grid.square_mut(12, 12, 1).entries.push(Entry { gid: f.grass });
            grid
        };
        plant(&mut f, 10, 10);
        let zones = JumboZone::defaults();
        let mut densifier = JumboTreeDensifier::new(&zones, f.jumbo, 1, Some(1));
        let stats = densifier.apply(&mut f.grid, &mut f.tiles, &forest(Some("100")), CELL);
        assert_eq!(stats.promoted, 0);
    }

    #[test]
    fn test_zero_density_and_no_zone() {
        let mut f = fixture();
        plant(&mut f, 10, 10);
        let zones = JumboZone::defaults();
        let mut densifier = JumboTreeDensifier::new(&zones, f.jumbo, 1, Some(2));
        let stats = densifier.apply(&mut f.grid, &mut f.tiles, &forest(Some("-20")), CELL);
        assert_eq!(stats.promoted, 0);
        let stats = densifier.apply(&mut f.grid, &mut f.tiles, &[], CELL);
        assert_eq!(stats.promoted, 0);
        assert_eq!(stats.trees, 1);
    }

    #[test]
    fn test_seeded_runs_match() {
        let run = |seed| {
            let mut f = fixture();
            for y in (6..30).step_by(2) {
                for x in (6..30).step_by(3) {
                    plant(&mut f, x, y);
                }
            }
            let zones = vec![JumboZone::new("Forest", 40)];
            let mut densifier = JumboTreeDensifier::new(&zones, f.jumbo, 1, Some(seed));
            densifier.apply(&mut f.grid, &mut f.tiles, &forest(None), CELL);
            (0..32).flat_map(|y| (0..32).map(move |x| (x, y))).map(|(x, y)| gids(&f, x, y)).collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }
}
