//! `.lotpack` body encoding.
//!
//! Layout: magic `LOTP`, `i32` version, `i32` chunk count, one `i64` file
//! offset per chunk, then each chunk's square stream. A stream covers every
//! level and square of its chunk; runs of empty squares collapse to
//! `(-1, count)` and an occupied square is `(tile_count + 1, room_id)`
//! followed by its tile ids.

use super::{BinaryReader, BinaryWriter};
use crate::error::{Error, Result};

pub const LOTPACK_MAGIC: &[u8; 4] = b"LOTP";
pub const LOTPACK_VERSION: i32 = 1;

const EMPTY_RUN: i32 = -1;

/// A square as stored in a lotpack. No tiles means empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackedSquare {
    pub room_id: i32,
    pub tiles: Vec<i32>,
}

impl PackedSquare {
    pub fn empty() -> Self {
        Self { room_id: -1, tiles: Vec::new() }
    }

    pub fn new(room_id: i32, tiles: Vec<i32>) -> Self {
        Self { room_id, tiles }
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Streaming lotpack writer. Chunks must be written in file order.
pub struct LotPackEncoder {
    writer: BinaryWriter,
    table_at: u64,
    chunk_count: usize,
    offsets: Vec<i64>,
    empty_run: i32,
    in_chunk: bool,
}

impl LotPackEncoder {
    pub fn new(version: i32, chunk_count: usize) -> Self {
        let mut writer = BinaryWriter::with_capacity(16 + chunk_count * 64);
        writer.write_bytes(LOTPACK_MAGIC);
        writer.write_i32_le(version);
        writer.write_i32_le(chunk_count as i32);
        let table_at = writer.position();
        for _ in 0..chunk_count {
            writer.write_i64_le(0);
        }
        Self {
            writer,
            table_at,
            chunk_count,
            offsets: Vec::with_capacity(chunk_count),
            empty_run: 0,
            in_chunk: false,
        }
    }

    pub fn begin_chunk(&mut self) {
        assert!(!self.in_chunk, "begin_chunk inside a chunk");
        assert!(self.offsets.len() < self.chunk_count, "more than {} chunks", self.chunk_count);
        self.offsets.push(self.writer.position() as i64);
        self.in_chunk = true;
    }

    pub fn push_empty(&mut self) {
        debug_assert!(self.in_chunk);
        self.empty_run += 1;
    }

    pub fn push_square(&mut self, room_id: i32, tiles: &[i32]) {
        debug_assert!(self.in_chunk);
        if tiles.is_empty() {
            self.push_empty();
            return;
        }
        self.flush_run();
        self.writer.write_i32_le(tiles.len() as i32 + 1);
        self.writer.write_i32_le(room_id);
        for &t in tiles {
            self.writer.write_i32_le(t);
        }
    }

    pub fn end_chunk(&mut self) {
        assert!(self.in_chunk, "end_chunk without begin_chunk");
        self.flush_run();
        self.in_chunk = false;
    }

    fn flush_run(&mut self) {
        if self.empty_run > 0 {
            self.writer.write_i32_le(EMPTY_RUN);
            self.writer.write_i32_le(self.empty_run);
            self.empty_run = 0;
        }
    }

    /// Rewrite the offset table and return the file contents.
    pub fn finish(mut self) -> Vec<u8> {
        assert!(!self.in_chunk, "finish inside a chunk");
        assert_eq!(self.offsets.len(), self.chunk_count, "not every chunk was written");
        for (i, &offset) in self.offsets.iter().enumerate() {
            self.writer.patch_i64_le(self.table_at + 8 * i as u64, offset);
        }
        self.writer.into_vec()
    }
}

/// Encode one chunk's squares as a standalone stream (no file header).
pub fn encode_square_stream(squares: &[PackedSquare]) -> Vec<u8> {
    let mut enc = LotPackEncoder::new(0, 1);
    let body_at = enc.writer.position() as usize;
    enc.begin_chunk();
    for sq in squares {
        enc.push_square(sq.room_id, &sq.tiles);
    }
    enc.end_chunk();
    enc.finish()[body_at..].to_vec()
}

/// Decode exactly `count` squares from a chunk stream.
pub fn decode_square_stream(reader: &mut BinaryReader, count: usize) -> Result<Vec<PackedSquare>> {
    let mut squares = Vec::with_capacity(count);
    while squares.len() < count {
        let head = reader.read_i32_le()?;
        if head == EMPTY_RUN {
            let run = reader.read_count()?;
            if run == 0 || squares.len() + run > count {
                return Err(Error::InvalidFormat(format!(
                    "empty run of {} at square {} of {}",
                    run,
                    squares.len(),
                    count
                )));
            }
            squares.extend(std::iter::repeat_with(PackedSquare::empty).take(run));
        } else if head >= 1 {
            let room_id = reader.read_i32_le()?;
            let n = (head - 1) as usize;
            let mut tiles = Vec::with_capacity(n);
            for _ in 0..n {
                tiles.push(reader.read_i32_le()?);
            }
            squares.push(PackedSquare { room_id, tiles });
        } else {
            return Err(Error::InvalidFormat(format!("bad square header {}", head)));
        }
    }
    Ok(squares)
}

/// Decoded `.lotpack`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotPack {
    pub version: i32,
    pub offsets: Vec<i64>,
    pub chunks: Vec<Vec<PackedSquare>>,
}

/// Decode a lotpack whose chunk streams each hold `squares_per_chunk` squares
/// (chunk area times level count).
pub fn decode_lot_pack(data: &[u8], squares_per_chunk: usize) -> Result<LotPack> {
    let mut reader = BinaryReader::new(data);
    reader.read_magic(LOTPACK_MAGIC)?;
    let version = reader.read_i32_le()?;
    let chunk_count = reader.read_count()?;
    let mut offsets = Vec::with_capacity(chunk_count.min(1 << 16));
    for _ in 0..chunk_count {
        offsets.push(reader.read_i64_le()?);
    }

    let mut chunks = Vec::with_capacity(offsets.len());
    for &offset in &offsets {
        let at = usize::try_from(offset)
            .map_err(|_| Error::InvalidFormat(format!("negative chunk offset {}", offset)))?;
        reader.set_position(at)?;
        chunks.push(decode_square_stream(&mut reader, squares_per_chunk)?);
    }

    Ok(LotPack { version, offsets, chunks })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_stream_rle() {
        let squares = vec![
            PackedSquare::empty(),
            PackedSquare::empty(),
            PackedSquare::empty(),
            PackedSquare::new(2, vec![5]),
            PackedSquare::empty(),
        ];
        let bytes = encode_square_stream(&squares);

        let words: Vec<i32> = bytes
            .chunks(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(words, vec![-1, 3, 2, 2, 5, -1, 1]);

        let mut reader = BinaryReader::new(&bytes);
        let decoded = decode_square_stream(&mut reader, 5).unwrap();
        assert_eq!(decoded, squares);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_offset_table_points_at_chunks() {
        let mut enc = LotPackEncoder::new(LOTPACK_VERSION, 2);
        enc.begin_chunk();
        enc.push_square(-1, &[1, 2]);
        enc.push_empty();
        enc.end_chunk();
        enc.begin_chunk();
        enc.push_empty();
        enc.push_empty();
        enc.end_chunk();
        let bytes = enc.finish();

        let pack = decode_lot_pack(&bytes, 2).unwrap();
        assert_eq!(pack.version, LOTPACK_VERSION);
        // header is 4 + 4 + 4 + 2 * 8 bytes
        assert_eq!(pack.offsets[0], 28);
        // first chunk: (3, -1, 1, 2) then (-1, 1)
        assert_eq!(pack.offsets[1], 28 + 6 * 4);
        assert_eq!(pack.chunks[0][0], PackedSquare::new(-1, vec![1, 2]));
        assert!(pack.chunks[1].iter().all(PackedSquare::is_empty));
    }

    #[test]
    fn test_overlong_run_rejected() {
        let bytes = encode_square_stream(&vec![PackedSquare::empty(); 4]);
        let mut reader = BinaryReader::new(&bytes);
        assert!(decode_square_stream(&mut reader, 3).is_err());
    }

    #[test]
    #[should_panic(expected = "not every chunk")]
    fn test_finish_requires_all_chunks() {
        let enc = LotPackEncoder::new(LOTPACK_VERSION, 1);
        enc.finish();
    }
}
