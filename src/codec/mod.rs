pub mod reader;
pub mod writer;
pub mod types;
pub mod lot_header;
pub mod lot_pack;
pub mod chunk_data;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;
pub use types::*;
pub use lot_header::{LotHeader, HeaderRoom, RoomObject, LOTHEADER_MAGIC, LOTHEADER_VERSION};
pub use lot_pack::{
    LotPack, LotPackEncoder, PackedSquare,
    encode_square_stream, decode_square_stream, decode_lot_pack,
    LOTPACK_MAGIC, LOTPACK_VERSION,
};
pub use chunk_data::{ChunkClass, ChunkRecord, encode_chunk_data, decode_chunk_data, CHUNKDATA_VERSION};
