use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("tiles directory not found: {}", .0.display())]
    MissingTilesDirectory(PathBuf),

    #[error("zombie density map not found: {}", .0.display())]
    MissingDensityMap(PathBuf),

    #[error("can't read zombie density map {}: {reason}", .path.display())]
    DensityMap { path: PathBuf, reason: String },

    #[error("zombie density map is {width}x{height} pixels but the world needs {need_width}x{need_height}")]
    DensityMapBounds { width: u32, height: u32, need_width: u32, need_height: u32 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("can't load map {}: {reason}", .path.display())]
    MapLoad { path: PathBuf, reason: String },

    #[error("tileset {name} uses external file {source_file}; only embedded-image tilesets are supported")]
    ExternalTileset { name: String, source_file: String },

    #[error("RoomDef \"{name}\" at ({x},{y}) {width}x{height} exceeds the bounds of map {map}")]
    RoomDefOutOfBounds { name: String, map: String, x: i32, y: i32, width: i32, height: i32 },

    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("invalid magic: expected {expected:?}, got {actual:?}")]
    InvalidMagic { expected: [u8; 4], actual: [u8; 4] },

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Configuration errors abort a whole run; everything else only fails one cell.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::MissingTilesDirectory(_)
                | Error::MissingDensityMap(_)
                | Error::DensityMap { .. }
                | Error::DensityMapBounds { .. }
                | Error::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::Config("bad".into()).is_fatal());
        assert!(Error::MissingTilesDirectory(PathBuf::from("tiles")).is_fatal());
        assert!(!Error::UnexpectedEof.is_fatal());
        assert!(!Error::ExternalTileset { name: "a".into(), source_file: "a.tsx".into() }.is_fatal());
    }
}
