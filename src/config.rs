use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{CellGeometry, CHUNKDATA_VERSION, LOTHEADER_VERSION, LOTPACK_VERSION};
use crate::error::{Error, Result};
use crate::generation::JumboZone;

/// Settings for one export run. Every field has a default, so a config file
/// only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub geometry: CellGeometry,
    pub lotheader_version: i32,
    pub lotpack_version: i32,
    pub chunkdata_version: i16,
    pub output_dir: PathBuf,
    /// Holds `tiledefinitions.json`
    pub tiles_dir: PathBuf,
    /// Maps are resolved against this directory; defaults to the world file's directory
    pub maps_dir: Option<PathBuf>,
    pub density_map: Option<PathBuf>,
    pub jumbo_zones: Vec<JumboZone>,
    pub jumbo_tileset: String,
    pub jumbo_tile_count: u32,
    /// Fixed seed for jumbo tree placement; unset means a different layout each run
    pub seed: Option<u64>,
    pub room_bucket_size: i32,
    /// Squares around a cell whose source maps are loaded too, so buildings
    /// crossing a source seam are merged the same way in every cell
    pub building_margin: i32,
    pub write_chunk_data: bool,
    pub write_map_features: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            geometry: CellGeometry::cell256(),
            lotheader_version: LOTHEADER_VERSION,
            lotpack_version: LOTPACK_VERSION,
            chunkdata_version: CHUNKDATA_VERSION,
            output_dir: PathBuf::from("lots"),
            tiles_dir: PathBuf::from("Tiles"),
            maps_dir: None,
            density_map: None,
            jumbo_zones: JumboZone::defaults(),
            jumbo_tileset: "jumbo_tree_01".to_string(),
            jumbo_tile_count: 1,
            seed: None,
            room_bucket_size: 10,
            building_margin: 64,
            write_chunk_data: true,
            write_map_features: false,
        }
    }
}

impl GenerationConfig {
    /// `<config dir>/lotgen/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lotgen").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("can't read {}: {}", path.display(), e)))?;
        let config: GenerationConfig = serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// An explicit path must exist; the default path is used only if present.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.geometry.validate().map_err(Error::Config)?;
        if self.room_bucket_size <= 0 {
            return Err(Error::Config("room_bucket_size must be positive".into()));
        }
        if self.building_margin < 0 {
            return Err(Error::Config("building_margin must not be negative".into()));
        }
        if self.jumbo_tile_count == 0 {
            return Err(Error::Config("jumbo_tile_count must be at least 1".into()));
        }
        if self.jumbo_tileset.is_empty() {
            return Err(Error::Config("jumbo_tileset is empty".into()));
        }
        if let Some(zone) = self.jumbo_zones.iter().find(|z| z.density > 100) {
            return Err(Error::Config(format!("jumbo zone {} has density {}", zone.name, zone.density)));
        }
        Ok(())
    }
}
