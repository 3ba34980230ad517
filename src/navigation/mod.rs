//! Path finder blocking data derived from the ground floor of a cell.

pub mod chunk;
pub mod file;
pub mod square;

pub use chunk::IsoChunk256;
pub use file::ChunkDataFile256;
pub use square::{IsoGridSquare256, SquareBits};
