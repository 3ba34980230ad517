//! Per-cell generation: composite the source maps, merge rooms, densify
//! trees, then encode the cell's files.

pub mod combined;
pub mod compositor;
pub mod density;
pub mod features;
pub mod grid;
pub mod jumbo;
pub mod lot_files;
pub mod manager;

pub use combined::{CombinedCellMaps, PlacedObject};
pub use compositor::{stamp_rooms, CompositeStats, GridCompositor, GRID_PADDING};
pub use density::ZombieDensityMap;
pub use features::{FeatureKind, MapFeature, MapFeatures};
pub use grid::{Entry, Grid, Square};
pub use jumbo::{JumboStats, JumboTreeDensifier, JumboZone};
pub use lot_files::{build_lot_header, build_lot_pack, HeaderInputs};
pub use manager::{CellFiles, GenerationReport, GenerationStats, LotFilesManager};
