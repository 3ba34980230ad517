use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap;
use tracing::debug;

use super::map::TileMap;
use crate::error::{Error, Result};

/// Source of loaded maps. Loading is synchronous: a call returns once the map
/// is ready or reports why it can't be.
pub trait MapLoader {
    fn load_map(&mut self, path: &Path) -> Result<Arc<TileMap>>;

    /// Forget a map no later cell needs. Returns true if it was held.
    fn evict(&mut self, _path: &Path) -> bool {
        false
    }
}

/// Loads JSON maps relative to a root directory and keeps them until evicted.
pub struct JsonMapLoader {
    root: PathBuf,
    cache: AHashMap<PathBuf, Arc<TileMap>>,
}

impl JsonMapLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: AHashMap::new(),
        }
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() { path.to_path_buf() } else { self.root.join(path) }
    }
}

impl MapLoader for JsonMapLoader {
    fn load_map(&mut self, path: &Path) -> Result<Arc<TileMap>> {
        let full = self.resolve(path);
        if let Some(map) = self.cache.get(&full) {
            return Ok(map.clone());
        }
        if !full.exists() {
            return Err(Error::MapLoad { path: full, reason: "file not found".into() });
        }
        debug!(path = %full.display(), "loading map");
        let map = Arc::new(TileMap::load(&full)?);
        self.cache.insert(full, map.clone());
        Ok(map)
    }

    fn evict(&mut self, path: &Path) -> bool {
        let full = self.resolve(path);
        self.cache.remove(&full).is_some()
    }
}

/// Maps registered up front, keyed by path.
#[derive(Default)]
pub struct MemoryMapLoader {
    maps: AHashMap<PathBuf, Arc<TileMap>>,
}

impl MemoryMapLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, map: TileMap) {
        self.maps.insert(path.into(), Arc::new(map));
    }
}

impl MapLoader for MemoryMapLoader {
    fn load_map(&mut self, path: &Path) -> Result<Arc<TileMap>> {
        self.maps
            .get(path)
            .cloned()
            .ok_or_else(|| Error::MapLoad { path: path.to_path_buf(), reason: "no such map".into() })
    }
}
