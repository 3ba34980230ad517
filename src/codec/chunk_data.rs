use super::{BinaryReader, BinaryWriter};
use crate::error::{Error, Result};

pub const CHUNKDATA_VERSION: i16 = 1;

/// First byte of every chunk record in `chunkdata_<cx>_<cy>.bin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChunkClass {
    Empty = 0,
    Solid = 1,
    /// Followed by one bitmask byte per square
    Regular = 2,
    Water = 3,
    Room = 4,
    Null = 5,
}

impl ChunkClass {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Empty),
            1 => Some(Self::Solid),
            2 => Some(Self::Regular),
            3 => Some(Self::Water),
            4 => Some(Self::Room),
            5 => Some(Self::Null),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkRecord {
    /// Every square of the chunk has the same classification
    Uniform(ChunkClass),
    /// Per-square bitmasks, x outer, y inner
    Regular(Vec<u8>),
}

pub fn encode_chunk_data(version: i16, chunks: &[ChunkRecord]) -> Vec<u8> {
    let mut writer = BinaryWriter::with_capacity(2 + chunks.len());
    writer.write_i16_le(version);
    for chunk in chunks {
        match chunk {
            ChunkRecord::Uniform(class) => {
                debug_assert_ne!(*class, ChunkClass::Regular);
                writer.write_u8(*class as u8);
            }
            ChunkRecord::Regular(bits) => {
                writer.write_u8(ChunkClass::Regular as u8);
                writer.write_bytes(bits);
            }
        }
    }
    writer.into_vec()
}

pub fn decode_chunk_data(
    data: &[u8],
    chunk_count: usize,
    squares_per_chunk: usize,
) -> Result<(i16, Vec<ChunkRecord>)> {
    let mut reader = BinaryReader::new(data);
    let version = reader.read_i16_le()?;
    let mut chunks = Vec::with_capacity(chunk_count);
    for i in 0..chunk_count {
        let b = reader.read_u8()?;
        let class = ChunkClass::from_u8(b)
            .ok_or_else(|| Error::InvalidFormat(format!("chunk {} has class {}", i, b)))?;
        if class == ChunkClass::Regular {
            chunks.push(ChunkRecord::Regular(reader.read_bytes(squares_per_chunk)?.to_vec()));
        } else {
            chunks.push(ChunkRecord::Uniform(class));
        }
    }
    if !reader.is_empty() {
        return Err(Error::InvalidFormat(format!("{} trailing bytes", reader.remaining())));
    }
    Ok((version, chunks))
}
