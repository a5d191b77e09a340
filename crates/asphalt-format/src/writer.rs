//! Builders for synthetic containers: fixtures, tools and round-trip tests.

use byteorder::{ByteOrder, LittleEndian};

/// Little-endian payload builder.
#[derive(Clone, Debug, Default)]
pub struct PayloadWriter {
    buf: Vec<u8>,
}

impl PayloadWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        let mut b = [0u8; 2];
        LittleEndian::write_u16(&mut b, v);
        self.buf.extend_from_slice(&b);
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, v);
        self.buf.extend_from_slice(&b);
        self
    }

    pub fn u16s(&mut self, vs: &[u16]) -> &mut Self {
        let start = self.buf.len();
        self.buf.resize(start + vs.len() * 2, 0);
        LittleEndian::write_u16_into(vs, &mut self.buf[start..]);
        self
    }

    pub fn u32s(&mut self, vs: &[u32]) -> &mut Self {
        let start = self.buf.len();
        self.buf.resize(start + vs.len() * 4, 0);
        LittleEndian::write_u32_into(vs, &mut self.buf[start..]);
        self
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Container builder: header on construction, then one call per chunk.
#[derive(Clone, Debug)]
pub struct ContainerWriter {
    out: PayloadWriter,
}

impl ContainerWriter {
    pub fn new(magic: &[u8; 4], version: u16) -> Self {
        let mut out = PayloadWriter::new();
        out.bytes(magic).u16(version);
        Self { out }
    }

    /// Appends a well-sized chunk.
    pub fn chunk(&mut self, tag: &[u8; 4], payload: &[u8]) -> &mut Self {
        let size = u32::try_from(payload.len()).unwrap_or(u32::MAX);
        self.out.bytes(tag).u32(size).bytes(payload);
        self
    }

    /// Appends bytes verbatim, for hand-built (possibly malformed) records.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.out.bytes(bytes);
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        self.out.as_bytes().to_vec()
    }
}
