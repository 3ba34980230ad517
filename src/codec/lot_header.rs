use super::{BinaryReader, BinaryWriter, Rect};
use crate::error::{Error, Result};

pub const LOTHEADER_MAGIC: &[u8; 4] = b"LOTH";
pub const LOTHEADER_VERSION: i32 = 1;

/// Tile with a metadata enum inside a room (doors, windows)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomObject {
    pub meta_enum: i32,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRoom {
    pub name: String,
    pub level: i32,
    /// Cell-local rectangles
    pub rects: Vec<Rect>,
    pub objects: Vec<RoomObject>,
}

/// Contents of a `world_<cx>_<cy>.lotheader` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotHeader {
    pub version: i32,
    /// Names of used tiles; the index is the tile id referenced by the lotpack
    pub tile_names: Vec<String>,
    pub chunk_width: i32,
    pub chunk_height: i32,
    pub min_level: i32,
    pub max_level: i32,
    pub rooms: Vec<HeaderRoom>,
    /// Room ids of each building
    pub buildings: Vec<Vec<i32>>,
    /// One byte per chunk, x outer, y inner
    pub zombie_density: Vec<u8>,
}

impl LotHeader {
    pub fn write(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(LOTHEADER_MAGIC);
        writer.write_i32_le(self.version);

        writer.write_i32_le(self.tile_names.len() as i32);
        for name in &self.tile_names {
            writer.write_line(name);
        }

        writer.write_i32_le(self.chunk_width);
        writer.write_i32_le(self.chunk_height);
        writer.write_i32_le(self.min_level);
        writer.write_i32_le(self.max_level);

        writer.write_i32_le(self.rooms.len() as i32);
        for room in &self.rooms {
            writer.write_line(&room.name);
            writer.write_i32_le(room.level);
            writer.write_i32_le(room.rects.len() as i32);
            for r in &room.rects {
                writer.write_i32_le(r.x);
                writer.write_i32_le(r.y);
                writer.write_i32_le(r.width);
                writer.write_i32_le(r.height);
            }
            writer.write_i32_le(room.objects.len() as i32);
            for o in &room.objects {
                writer.write_i32_le(o.meta_enum);
                writer.write_i32_le(o.x);
                writer.write_i32_le(o.y);
            }
        }

        writer.write_i32_le(self.buildings.len() as i32);
        for building in &self.buildings {
            writer.write_i32_le(building.len() as i32);
            for &room_id in building {
                writer.write_i32_le(room_id);
            }
        }

        writer.write_bytes(&self.zombie_density);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        self.write(&mut writer);
        writer.into_vec()
    }

    /// Decode a header; `density_len` is the number of chunks per cell squared.
    pub fn read(reader: &mut BinaryReader, density_len: usize) -> Result<Self> {
        reader.read_magic(LOTHEADER_MAGIC)?;
        let version = reader.read_i32_le()?;

        let tile_count = reader.read_count()?;
        let mut tile_names = Vec::with_capacity(tile_count.min(1 << 16));
        for _ in 0..tile_count {
            tile_names.push(reader.read_line()?);
        }

        let chunk_width = reader.read_i32_le()?;
        let chunk_height = reader.read_i32_le()?;
        let min_level = reader.read_i32_le()?;
        let max_level = reader.read_i32_le()?;
        if min_level > max_level {
            return Err(Error::InvalidFormat(format!("level range {}..{}", min_level, max_level)));
        }

        let room_count = reader.read_count()?;
        let mut rooms = Vec::with_capacity(room_count.min(1 << 16));
        for _ in 0..room_count {
            let name = reader.read_line()?;
            let level = reader.read_i32_le()?;
            let rect_count = reader.read_count()?;
            let mut rects = Vec::with_capacity(rect_count.min(1 << 12));
            for _ in 0..rect_count {
                rects.push(Rect::new(
                    reader.read_i32_le()?,
                    reader.read_i32_le()?,
                    reader.read_i32_le()?,
                    reader.read_i32_le()?,
                ));
            }
            let object_count = reader.read_count()?;
            let mut objects = Vec::with_capacity(object_count.min(1 << 12));
            for _ in 0..object_count {
                objects.push(RoomObject {
                    meta_enum: reader.read_i32_le()?,
                    x: reader.read_i32_le()?,
                    y: reader.read_i32_le()?,
                });
            }
            rooms.push(HeaderRoom { name, level, rects, objects });
        }

        let building_count = reader.read_count()?;
        let mut buildings = Vec::with_capacity(building_count.min(1 << 16));
        for _ in 0..building_count {
            let n = reader.read_count()?;
            let mut ids = Vec::with_capacity(n.min(1 << 12));
            for _ in 0..n {
                let id = reader.read_i32_le()?;
                if id < 0 || id as usize >= rooms.len() {
                    return Err(Error::InvalidFormat(format!("building references room {}", id)));
                }
                ids.push(id);
            }
            buildings.push(ids);
        }

        let zombie_density = reader.read_bytes(density_len)?.to_vec();

        Ok(Self {
            version,
            tile_names,
            chunk_width,
            chunk_height,
            min_level,
            max_level,
            rooms,
            buildings,
            zombie_density,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LotHeader {
        LotHeader {
            version: LOTHEADER_VERSION,
            tile_names: vec!["floors_interior_tilesandwood_01_0".into(), "walls_exterior_house_01_4".into()],
            chunk_width: 8,
            chunk_height: 8,
            min_level: 0,
            max_level: 1,
            rooms: vec![
                HeaderRoom {
                    name: "kitchen".into(),
                    level: 0,
                    rects: vec![Rect::new(0, 0, 5, 5), Rect::new(5, 0, 5, 5)],
                    objects: vec![RoomObject { meta_enum: 3, x: 2, y: 0 }],
                },
                HeaderRoom { name: "bedroom".into(), level: 1, rects: vec![Rect::new(0, 0, 5, 5)], objects: vec![] },
            ],
            buildings: vec![vec![0, 1]],
            zombie_density: vec![7; 4],
        }
    }

    #[test]
    fn test_header_layout_prefix() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[0..4], b"LOTH");
        assert_eq!(&bytes[4..8], &1i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &2i32.to_le_bytes());
        assert!(bytes[12..].starts_with(b"floors_interior_tilesandwood_01_0\n"));
        assert_eq!(&bytes[bytes.len() - 4..], &[7, 7, 7, 7]);
    }

    #[test]
    fn test_header_decode() {
        let header = sample();
        let bytes = header.to_bytes();
        let mut reader = BinaryReader::new(&bytes);
        let decoded = LotHeader::read(&mut reader, 4).unwrap();
        assert_eq!(decoded, header);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_header_rejects_dangling_room_id() {
        let mut header = sample();
        header.buildings = vec![vec![0, 5]];
        let bytes = header.to_bytes();
        let mut reader = BinaryReader::new(&bytes);
        assert!(matches!(LotHeader::read(&mut reader, 4), Err(Error::InvalidFormat(_))));
    }
}
