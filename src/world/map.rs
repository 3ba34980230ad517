use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Map projection. Only `Isometric` stores upper levels skewed by three
/// squares per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Isometric,
    #[default]
    LevelIsometric,
    Orthogonal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tileset {
    #[serde(default)]
    pub name: String,
    /// Image file the tiles are cut from, e.g. `Tiles/walls_exterior_house_01.png`
    #[serde(default)]
    pub image_source: String,
    /// External tileset file; not supported by the exporter
    #[serde(default)]
    pub source: String,
    pub first_gid: u32,
    pub tile_count: u32,
}

impl Tileset {
    /// Image name without directories or `.png`, shared by every map using this image.
    pub fn normalized_name(&self) -> &str {
        let raw = if self.image_source.is_empty() { &self.name } else { &self.image_source };
        let file = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
        file.strip_suffix(".png")
            .or_else(|| file.strip_suffix(".PNG"))
            .unwrap_or(file)
    }

    pub fn is_external(&self) -> bool {
        !self.source.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    #[serde(default)]
    pub level: i32,
    /// Row-major map-local gids, 0 = no tile
    pub data: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapObject {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectGroup {
    pub name: String,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

impl ObjectGroup {
    /// `RoomDefs`, optionally prefixed with the level (`1_RoomDefs`)
    pub fn is_room_defs(&self) -> bool {
        let base = self.name.split_once('_').map(|(_, rest)| rest).unwrap_or(&self.name);
        base.eq_ignore_ascii_case("RoomDefs") || self.name.eq_ignore_ascii_case("RoomDefs")
    }
}

/// A loaded tile map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    /// File name the map was loaded from
    #[serde(default)]
    pub name: String,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub tilesets: Vec<Tileset>,
    #[serde(default)]
    pub layers: Vec<TileLayer>,
    #[serde(default)]
    pub object_groups: Vec<ObjectGroup>,
}

/// A rendered tile: the tileset it comes from and its index inside that tileset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef<'a> {
    pub tileset: &'a Tileset,
    pub tile_id: u32,
}

impl TileMap {
    pub fn from_json(data: &str, name: &str) -> Result<Self> {
        let mut map: TileMap = serde_json::from_str(data).map_err(|e| Error::MapLoad {
            path: name.into(),
            reason: e.to_string(),
        })?;
        map.name = name.to_string();
        map.validate()?;
        Ok(map)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| Error::MapLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_json(&data, &name)
    }

    /// Check layer sizes and sort tilesets by first gid.
    pub fn validate(&mut self) -> Result<()> {
        let fail = |reason: String| Error::MapLoad { path: self.name.clone().into(), reason };
        if self.width <= 0 || self.height <= 0 {
            return Err(fail(format!("invalid size {}x{}", self.width, self.height)));
        }
        let area = (self.width * self.height) as usize;
        for layer in &self.layers {
            if layer.data.len() != area {
                return Err(fail(format!(
                    "layer {} has {} tiles, expected {}",
                    layer.name,
                    layer.data.len(),
                    area
                )));
            }
        }
        if let Some(ts) = self.tilesets.iter().find(|ts| ts.first_gid == 0) {
            return Err(fail(format!("tileset {} has first gid 0", ts.name)));
        }
        self.tilesets.sort_by_key(|ts| ts.first_gid);
        Ok(())
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Resolve a map-local gid to its tileset. Gids outside every tileset resolve to `None`.
    pub fn resolve_gid(&self, gid: u32) -> Option<CellRef<'_>> {
        if gid == 0 {
            return None;
        }
        let ts = self.tilesets.iter().rev().find(|ts| ts.first_gid <= gid)?;
        let tile_id = gid - ts.first_gid;
        if tile_id >= ts.tile_count {
            return None;
        }
        Some(CellRef { tileset: ts, tile_id })
    }

    pub fn cell_at(&self, layer: &TileLayer, x: i32, y: i32) -> Option<CellRef<'_>> {
        if !self.contains(x, y) {
            return None;
        }
        self.resolve_gid(layer.data[(y * self.width + x) as usize])
    }

    pub fn level_range(&self) -> Option<(i32, i32)> {
        let min = self.layers.iter().map(|l| l.level).min()?;
        let max = self.layers.iter().map(|l| l.level).max()?;
        Some((min, max))
    }

    /// RoomDef objects with the level of their group
    pub fn room_defs(&self) -> impl Iterator<Item = (i32, &MapObject)> {
        self.object_groups
            .iter()
            .filter(|g| g.is_room_defs())
            .flat_map(|g| g.objects.iter().map(move |o| (g.level, o)))
    }
}
