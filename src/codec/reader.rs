use crate::error::{Error, Result};

/// Little-endian binary reader for lot files
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::UnexpectedEof);
        }
        self.pos = pos;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        if self.remaining() < 1 {
            return Err(Error::UnexpectedEof);
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16_le(&mut self) -> Result<i16> {
        let bytes = self.read_bytes(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(self.read_u32_le()? as i32)
    }

    pub fn read_i64_le(&mut self) -> Result<i64> {
        let bytes = self.read_bytes(8)?;
        Ok(i64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3],
            bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Read a count field and reject negative values
    pub fn read_count(&mut self) -> Result<usize> {
        let v = self.read_i32_le()?;
        usize::try_from(v).map_err(|_| Error::InvalidFormat(format!("negative count {}", v)))
    }

    pub fn read_magic(&mut self, expected: &[u8; 4]) -> Result<()> {
        let bytes = self.read_bytes(4)?;
        let actual = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if &actual != expected {
            return Err(Error::InvalidMagic { expected: *expected, actual });
        }
        Ok(())
    }

    /// Read a newline-terminated ASCII string
    pub fn read_line(&mut self) -> Result<String> {
        let rest = &self.data[self.pos.min(self.data.len())..];
        let len = rest.iter().position(|&b| b == b'\n').ok_or(Error::UnexpectedEof)?;
        let s = std::str::from_utf8(&rest[..len])
            .map_err(|e| Error::InvalidFormat(format!("non-ASCII name: {}", e)))?
            .to_string();
        self.pos += len + 1;
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof() {
        let data = [1u8, 2, 3];
        let mut reader = BinaryReader::new(&data);
        assert!(matches!(reader.read_i32_le(), Err(Error::UnexpectedEof)));
        assert_eq!(reader.read_u8().unwrap(), 1);
    }

    #[test]
    fn test_magic_mismatch() {
        let data = *b"LOTPxxxx";
        let mut reader = BinaryReader::new(&data);
        assert!(matches!(reader.read_magic(b"LOTH"), Err(Error::InvalidMagic { .. })));
    }

    #[test]
    fn test_unterminated_line() {
        let data = *b"abc";
        let mut reader = BinaryReader::new(&data);
        assert!(matches!(reader.read_line(), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn test_negative_count() {
        let data = (-3i32).to_le_bytes();
        let mut reader = BinaryReader::new(&data);
        assert!(matches!(reader.read_count(), Err(Error::InvalidFormat(_))));
    }
}
