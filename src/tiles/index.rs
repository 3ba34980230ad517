use indexmap::IndexMap;
use tracing::warn;

use super::properties::{TileFlags, TileMetadata};
use crate::error::{Error, Result};
use crate::world::{CellRef, Tileset};

/// gid 0 is "no tile"
pub const NO_TILE: u32 = 0;

#[derive(Debug, Clone)]
pub struct TileEntry {
    /// `<image name>_<index>`, as written into the lotheader
    pub name: String,
    pub tileset: String,
    pub tile_id: u32,
    pub used: bool,
    /// Sequential id among used tiles, -1 until used
    pub id: i32,
    pub meta_enum: i32,
    pub flags: TileFlags,
}

#[derive(Debug, Clone, Copy)]
struct GidRange {
    first_gid: u32,
    count: u32,
}

/// Global tile ids for one export run.
///
/// Tilesets cut from the same image share one gid range no matter how many
/// maps reference them. Only tiles marked used end up in the lotheader.
pub struct TileIndex {
    ranges: IndexMap<String, GidRange>,
    tiles: Vec<TileEntry>,
    used: Vec<u32>,
}

impl TileIndex {
    pub fn new() -> Self {
        let mut index = Self {
            ranges: IndexMap::new(),
            tiles: Vec::new(),
            used: Vec::new(),
        };
        index.push_placeholder();
        index
    }

    fn push_placeholder(&mut self) {
        self.tiles.push(TileEntry {
            name: String::new(),
            tileset: String::new(),
            tile_id: 0,
            used: false,
            id: -1,
            meta_enum: -1,
            flags: TileFlags::empty(),
        });
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
        self.tiles.clear();
        self.used.clear();
        self.push_placeholder();
    }

    /// First gid of `tileset`, reusing the range of an earlier tileset with the same image.
    pub fn assign_first_gid(&mut self, tileset: &Tileset, meta: &dyn TileMetadata) -> Result<u32> {
        if tileset.is_external() {
            return Err(Error::ExternalTileset {
                name: tileset.name.clone(),
                source_file: tileset.source.clone(),
            });
        }
        let name = tileset.normalized_name();
        if let Some(range) = self.ranges.get(name) {
            if tileset.tile_count > range.count {
                warn!(
                    tileset = name,
                    registered = range.count,
                    found = tileset.tile_count,
                    "tileset image has more tiles than its first registration"
                );
            }
            return Ok(range.first_gid);
        }
        Ok(self.register_image(name, tileset.tile_count, meta))
    }

    /// Register tiles by image name, e.g. the jumbo tree tileset no map references.
    pub fn register_image(&mut self, name: &str, tile_count: u32, meta: &dyn TileMetadata) -> u32 {
        if let Some(range) = self.ranges.get(name) {
            return range.first_gid;
        }
        let first_gid = self.tiles.len() as u32;
        for i in 0..tile_count {
            self.tiles.push(TileEntry {
                name: format!("{}_{}", name, i),
                tileset: name.to_string(),
                tile_id: i,
                used: false,
                id: -1,
                meta_enum: meta.enum_value(name, i),
                flags: meta.properties(name, i),
            });
        }
        self.ranges.insert(name.to_string(), GidRange { first_gid, count: tile_count });
        first_gid
    }

    pub fn first_gid(&self, image_name: &str) -> Option<u32> {
        self.ranges.get(image_name).map(|r| r.first_gid)
    }

    /// Global id of a rendered tile, `NO_TILE` when its tileset is unknown.
    pub fn gid_for(&self, cell: &CellRef) -> u32 {
        match self.ranges.get(cell.tileset.normalized_name()) {
            Some(range) if cell.tile_id < range.count => range.first_gid + cell.tile_id,
            _ => NO_TILE,
        }
    }

    /// Mark a tile as used and return its sequential id.
    pub fn mark_used(&mut self, gid: u32) -> i32 {
        assert!(gid != NO_TILE && (gid as usize) < self.tiles.len(), "unregistered gid {}", gid);
        let entry = &mut self.tiles[gid as usize];
        if !entry.used {
            entry.used = true;
            entry.id = self.used.len() as i32;
            self.used.push(gid);
        }
        entry.id
    }

    pub fn tile(&self, gid: u32) -> &TileEntry {
        assert!((gid as usize) < self.tiles.len(), "unregistered gid {}", gid);
        &self.tiles[gid as usize]
    }

    pub fn flags(&self, gid: u32) -> TileFlags {
        self.tiles.get(gid as usize).map(|t| t.flags).unwrap_or_default()
    }

    /// Used tiles in id order
    pub fn used_tiles(&self) -> impl Iterator<Item = &TileEntry> {
        self.used.iter().map(|&gid| &self.tiles[gid as usize])
    }

    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    /// Registered tiles, excluding the gid 0 placeholder
    pub fn len(&self) -> usize {
        self.tiles.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TileIndex {
    fn default() -> Self {
        Self::new()
    }
}
