use std::path::Path;

use ahash::AHashMap;
use bitflags::bitflags;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

bitflags! {
    /// Tile properties the exporter cares about
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TileFlags: u32 {
        const SOLID = 1 << 0;
        const SOLID_TRANS = 1 << 1;
        const WALL_N = 1 << 2;
        const WALL_W = 1 << 3;
        const WALL_NW = 1 << 4;
        const WALL_N_TRANS = 1 << 5;
        const WALL_W_TRANS = 1 << 6;
        const WALL_NW_TRANS = 1 << 7;
        const WINDOW_N = 1 << 8;
        const WINDOW_W = 1 << 9;
        const HOPPABLE_N = 1 << 10;
        const HOPPABLE_W = 1 << 11;
        const DOOR_N = 1 << 12;
        const DOOR_W = 1 << 13;
        const WATER = 1 << 14;
        const TREE = 1 << 15;
        const FLOOR = 1 << 16;
        const VEGETATION = 1 << 17;
    }
}

impl TileFlags {
    /// Map a tile property name to its flag. Unknown names map to `None`.
    pub fn from_property(name: &str) -> Option<Self> {
        let flag = match name {
            "solid" => Self::SOLID,
            "solidtrans" => Self::SOLID_TRANS,
            "WallN" => Self::WALL_N,
            "WallW" => Self::WALL_W,
            "WallNW" => Self::WALL_NW,
            "WallNTrans" => Self::WALL_N_TRANS,
            "WallWTrans" => Self::WALL_W_TRANS,
            "WallNWTrans" => Self::WALL_NW_TRANS,
            "WindowN" => Self::WINDOW_N,
            "WindowW" => Self::WINDOW_W,
            "HoppableN" => Self::HOPPABLE_N,
            "HoppableW" => Self::HOPPABLE_W,
            "doorN" | "DoorN" => Self::DOOR_N,
            "doorW" | "DoorW" => Self::DOOR_W,
            "water" => Self::WATER,
            "tree" => Self::TREE,
            "solidfloor" | "floor" => Self::FLOOR,
            "vegitation" | "vegetation" => Self::VEGETATION,
            _ => return None,
        };
        Some(flag)
    }

    pub fn is_solid(self) -> bool {
        self.intersects(Self::SOLID | Self::SOLID_TRANS)
    }

    /// Blocks movement across the square's north edge
    pub fn blocks_north(self) -> bool {
        self.intersects(
            Self::WALL_N | Self::WALL_NW | Self::WALL_N_TRANS | Self::WALL_NW_TRANS | Self::WINDOW_N,
        )
    }

    /// Blocks movement across the square's west edge
    pub fn blocks_west(self) -> bool {
        self.intersects(
            Self::WALL_W | Self::WALL_NW | Self::WALL_W_TRANS | Self::WALL_NW_TRANS | Self::WINDOW_W,
        )
    }

    /// Tiles that don't stop a jumbo tree being planted next to them
    pub fn is_floor_or_vegetation(self) -> bool {
        self.intersects(Self::FLOOR | Self::VEGETATION | Self::TREE)
    }
}

/// Tile metadata lookups, keyed by normalized tileset name and tile index.
pub trait TileMetadata {
    /// Door/window orientation class written into lotheader room objects, -1 if none
    fn enum_value(&self, tileset: &str, tile_id: u32) -> i32;
    fn properties(&self, tileset: &str, tile_id: u32) -> TileFlags;
}

#[derive(Debug, Clone, Copy, Default)]
struct TileDef {
    flags: TileFlags,
    meta_enum: i32,
}

#[derive(Deserialize)]
struct TileDefFile {
    #[serde(default)]
    tilesets: Vec<TilesetDefs>,
}

#[derive(Deserialize)]
struct TilesetDefs {
    name: String,
    #[serde(default)]
    tiles: Vec<TileDefEntry>,
}

#[derive(Deserialize)]
struct TileDefEntry {
    id: u32,
    #[serde(default)]
    properties: Vec<String>,
    #[serde(default = "no_enum")]
    meta_enum: i32,
}

fn no_enum() -> i32 {
    -1
}

/// Tile property database, normally `<tiles_directory>/tiledefinitions.json`.
#[derive(Debug, Default)]
pub struct TileDefinitions {
    tilesets: AHashMap<String, AHashMap<u32, TileDef>>,
}

impl TileDefinitions {
    pub const FILE_NAME: &'static str = "tiledefinitions.json";

    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a tiles directory. A missing directory is a configuration error.
    pub fn load_dir(tiles_dir: &Path) -> Result<Self> {
        if !tiles_dir.is_dir() {
            return Err(Error::MissingTilesDirectory(tiles_dir.to_path_buf()));
        }
        let path = tiles_dir.join(Self::FILE_NAME);
        if !path.exists() {
            return Err(Error::Config(format!("{} not found", path.display())));
        }
        let data = std::fs::read_to_string(&path)?;
        let defs = Self::from_json(&data)?;
        debug!(tiles = defs.len(), path = %path.display(), "loaded tile definitions");
        Ok(defs)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let file: TileDefFile = serde_json::from_str(data)?;
        let mut defs = Self::new();
        for ts in file.tilesets {
            for tile in ts.tiles {
                let flags = tile
                    .properties
                    .iter()
                    .filter_map(|p| TileFlags::from_property(p))
                    .fold(TileFlags::empty(), |a, b| a | b);
                defs.tilesets
                    .entry(ts.name.clone())
                    .or_default()
                    .insert(tile.id, TileDef { flags, meta_enum: tile.meta_enum });
            }
        }
        Ok(defs)
    }

    pub fn set(&mut self, tileset: &str, tile_id: u32, flags: TileFlags, meta_enum: i32) {
        self.tilesets
            .entry(tileset.to_string())
            .or_default()
            .insert(tile_id, TileDef { flags, meta_enum });
    }

    /// Number of tiles with definitions
    pub fn len(&self) -> usize {
        self.tilesets.values().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, tileset: &str, tile_id: u32) -> Option<&TileDef> {
        self.tilesets.get(tileset)?.get(&tile_id)
    }
}

impl TileMetadata for TileDefinitions {
    fn enum_value(&self, tileset: &str, tile_id: u32) -> i32 {
        self.get(tileset, tile_id).map(|d| d.meta_enum).unwrap_or(-1)
    }

    fn properties(&self, tileset: &str, tile_id: u32) -> TileFlags {
        self.get(tileset, tile_id).map(|d| d.flags).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let json = r#"{"tilesets": [
            {"name": "fixtures_doors_01", "tiles": [{"id": 0, "properties": ["doorN", "solidtrans"], "meta_enum": 2}]},
            {"name": "e_trees_01", "tiles": [{"id": 3, "properties": ["tree", "unknownProp"]}]}
        ]}"#;
        let defs = TileDefinitions::from_json(json).unwrap();
        assert_eq!(defs.enum_value("fixtures_doors_01", 0), 2);
        assert_eq!(
            defs.properties("fixtures_doors_01", 0),
            TileFlags::DOOR_N | TileFlags::SOLID_TRANS
        );
        assert_eq!(defs.properties("e_trees_01", 3), TileFlags::TREE);
        assert_eq!(defs.enum_value("e_trees_01", 3), -1);
        assert_eq!(defs.properties("missing", 0), TileFlags::empty());
    }

    #[test]
    fn test_edge_blocking() {
        assert!(TileFlags::WALL_NW.blocks_north());
        assert!(TileFlags::WALL_NW.blocks_west());
        assert!(TileFlags::WINDOW_W.blocks_west());
        assert!(!TileFlags::WALL_W.blocks_north());
        assert!(!TileFlags::DOOR_N.blocks_north());
    }

    #[test]
    fn test_missing_tiles_dir() {
        let err = TileDefinitions::load_dir(Path::new("/nonexistent/tiles")).unwrap_err();
        assert!(matches!(err, Error::MissingTilesDirectory(_)));
        assert!(err.is_fatal());
    }
}
