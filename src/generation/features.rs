use std::path::Path;

use lot_outline::{outlines, signed_area2, BitGrid, Ring, SimplifyOptions};
use serde::{Deserialize, Serialize};

use super::grid::Grid;
use crate::codec::{CellPosition, Rect};
use crate::error::Result;
use crate::tiles::{TileFlags, TileIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Water,
    Building,
}

/// One polygon: an outer ring and the holes inside it, in cell-local corners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapFeature {
    pub kind: FeatureKind,
    pub outer: Vec<[i32; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<[i32; 2]>>,
}

/// World map polygons of one cell, written as `worldmap_<cx>_<cy>.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapFeatures {
    pub cell: CellPosition,
    pub width: i32,
    pub height: i32,
    pub features: Vec<MapFeature>,
}

impl MapFeatures {
    /// Trace water (level 0) and room footprints (any level) of `cell`.
    pub fn trace(grid: &Grid, tiles: &TileIndex, position: CellPosition, cell: Rect) -> Self {
        let w = cell.width as usize;
        let h = cell.height as usize;
        let water = BitGrid::from_fn(w, h, |x, y| {
            let (wx, wy) = (cell.x + x as i32, cell.y + y as i32);
            grid.get(wx, wy, 0)
                .is_some_and(|s| s.entries.iter().any(|e| tiles.flags(e.gid).contains(TileFlags::WATER)))
        });
        let buildings = BitGrid::from_fn(w, h, |x, y| {
            let (wx, wy) = (cell.x + x as i32, cell.y + y as i32);
            grid.levels().any(|z| grid.get(wx, wy, z).is_some_and(|s| s.room_id >= 0))
        });

        let options = SimplifyOptions::with_border(cell.width, cell.height);
        let mut features = polygons(FeatureKind::Water, outlines(&water, &options));
        features.extend(polygons(FeatureKind::Building, outlines(&buildings, &options)));
        Self { cell: position, width: cell.width, height: cell.height, features }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn file_name(cell: CellPosition) -> String {
        format!("worldmap_{}_{}.json", cell.x, cell.y)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(serde_json::from_slice(&std::fs::read(path)?)?)
    }
}

fn bounds(ring: &Ring) -> Rect {
    let x0 = ring.iter().map(|p| p.0).min().unwrap_or(0);
    let y0 = ring.iter().map(|p| p.1).min().unwrap_or(0);
    let x1 = ring.iter().map(|p| p.0).max().unwrap_or(0);
    let y1 = ring.iter().map(|p| p.1).max().unwrap_or(0);
    Rect::new(x0, y0, x1 - x0, y1 - y0)
}

fn to_points(ring: &Ring) -> Vec<[i32; 2]> {
    ring.iter().map(|&(x, y)| [x, y]).collect()
}

/// Pair every hole with the smallest outer ring whose bounds enclose it.
fn polygons(kind: FeatureKind, rings: Vec<Ring>) -> Vec<MapFeature> {
    let (outers, holes): (Vec<Ring>, Vec<Ring>) = rings.into_iter().partition(|r| signed_area2(r) > 0);
    let outer_bounds: Vec<Rect> = outers.iter().map(bounds).collect();
    let mut features: Vec<MapFeature> = outers
        .iter()
        .map(|r| MapFeature { kind, outer: to_points(r), holes: Vec::new() })
        .collect();

    for hole in &holes {
        let hb = bounds(hole);
        let owner = outers
            .iter()
            .enumerate()
            .filter(|(i, _)| outer_bounds[*i].contains_rect(&hb))
            .min_by_key(|(_, r)| signed_area2(r))
            .map(|(i, _)| i);
        if let Some(i) = owner {
            features[i].holes.push(to_points(hole));
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::grid::Entry;
    use crate::tiles::TileDefinitions;
    use crate::world::map::testing::tileset;

    #[test]
    fn test_pond_and_house() {
        let mut defs = TileDefinitions::new();
        defs.set("blends_natural", 0, TileFlags::WATER, -1);
        let mut tiles = TileIndex::new();
        let water = tiles.assign_first_gid(&tileset("blends_natural", 1, 1), &defs).unwrap();

        let cell = Rect::new(256, 0, 16, 16);
        let mut grid = Grid::new(cell, 0, 1);
        for y in 2..5 {
            for x in 258..261 {
                grid.square_mut(x, y, 0).entries.push(Entry { gid: water });
            }
        }
        grid.square_mut(270, 10, 1).room_id = 0;

        let features = MapFeatures::trace(&grid, &tiles, CellPosition::new(1, 0), cell);
        assert_eq!(features.features.len(), 2);
        assert_eq!(features.features[0].kind, FeatureKind::Water);
        assert_eq!(features.features[0].outer, vec![[2, 2], [5, 2], [5, 5], [2, 5]]);
        assert_eq!(features.features[1].kind, FeatureKind::Building);
        assert_eq!(features.features[1].outer, vec![[14, 10], [15, 10], [15, 11], [14, 11]]);
    }

    #[test]
    fn test_courtyard_becomes_hole() {
        let cell = Rect::new(0, 0, 10, 10);
        let mut grid = Grid::new(cell, 0, 0);
        for y in 1..6 {
            for x in 1..6 {
                if (x, y) != (3, 3) {
                    grid.square_mut(x, y, 0).room_id = 2;
                }
            }
        }
        let features = MapFeatures::trace(&grid, &TileIndex::new(), CellPosition::new(0, 0), cell);
        assert_eq!(features.features.len(), 1);
        assert_eq!(features.features[0].holes.len(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let features = MapFeatures {
            cell: CellPosition::new(3, 4),
            width: 256,
            height: 256,
            features: vec![MapFeature { kind: FeatureKind::Water, outer: vec![[0, 0], [4, 0], [4, 4]], holes: vec![] }],
        };
        let path = dir.path().join(MapFeatures::file_name(features.cell));
        std::fs::write(&path, features.to_json().unwrap()).unwrap();
        assert_eq!(MapFeatures::load(&path).unwrap(), features);
        assert!(path.ends_with("worldmap_3_4.json"));
    }
}
