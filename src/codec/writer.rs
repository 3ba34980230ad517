/// Little-endian binary writer for lot files
pub struct BinaryWriter {
    data: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte offset the next write lands at
    pub fn position(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.write_u8(v as u8);
    }

    pub fn write_i16_le(&mut self, v: i16) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32_le(&mut self, v: i32) {
        self.write_u32_le(v as u32);
    }

    pub fn write_i64_le(&mut self, v: i64) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a newline-terminated ASCII string (tile and room names)
    pub fn write_line(&mut self, s: &str) {
        debug_assert!(!s.contains('\n') && !s.contains('\0'), "invalid name {s:?}");
        self.write_bytes(s.as_bytes());
        self.write_u8(b'\n');
    }

    /// Overwrite eight bytes at `at` with `v`, used for the lotpack offset table
    pub fn patch_i64_le(&mut self, at: u64, v: i64) {
        let at = at as usize;
        assert!(at + 8 <= self.data.len(), "patch at {at} past end {}", self.data.len());
        self.data[at..at + 8].copy_from_slice(&v.to_le_bytes());
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BinaryWriter> for Vec<u8> {
    fn from(writer: BinaryWriter) -> Self {
        writer.into_vec()
    }
}
