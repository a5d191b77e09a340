//! Chunk container: `magic:4 version:u16` header followed by
//! `tag:4 size:u32le payload:size` records until end of input.

use std::fmt;

use crate::cursor::ByteCursor;
use crate::error::FormatError;

/// Header size: magic plus version.
pub const HEADER_LEN: usize = 6;
/// Chunk header size: tag plus payload length.
pub const CHUNK_HEADER_LEN: usize = 8;

/// Four-byte chunk or container tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkTag(pub [u8; 4]);

impl ChunkTag {
    pub const fn new(tag: &[u8; 4]) -> Self {
        Self(*tag)
    }

    /// Builds a tag from up to four bytes, zero-padding short input.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut tag = [0u8; 4];
        let n = bytes.len().min(4);
        tag[..n].copy_from_slice(&bytes[..n]);
        Self(tag)
    }

    /// True for exactly four ASCII uppercase letters.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.0.iter().all(u8::is_ascii_uppercase)
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", char::from(b))?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

/// One chunk. `payload` covers exactly the declared payload bytes.
#[derive(Clone, Copy, Debug)]
pub struct ChunkRecord<'a> {
    pub tag: ChunkTag,
    pub size: u32,
    /// Offset of the payload within the container.
    pub offset: usize,
    pub payload: ByteCursor<'a>,
}

impl ChunkRecord<'_> {
    /// True when the input ended before the declared size.
    pub fn is_truncated(&self) -> bool {
        self.payload.len() < self.size as usize
    }
}

/// Single-pass reader over the chunks of a validated container.
///
/// The reader advances past each chunk's declared size itself, so a consumer
/// that under-reads its payload cannot desynchronise the stream. A malformed
/// tag still ends the stream with `CorruptStream`; the reader is fused after
/// the first error.
#[derive(Clone, Debug)]
pub struct ChunkReader<'a> {
    cursor: ByteCursor<'a>,
    failed: bool,
}

impl<'a> ChunkReader<'a> {
    /// Validates the header and positions the reader at the first chunk.
    pub fn open(data: &'a [u8], magic: ChunkTag, version: u16) -> Result<Self, FormatError> {
        let mut cursor = ByteCursor::new(data);
        let found_magic = ChunkTag::from_slice(cursor.read_bytes(4));
        let found_version = cursor.read_u16_le();
        if found_magic != magic || found_version != version {
            return Err(FormatError::FormatMismatch {
                expected_magic: magic,
                found_magic,
                expected_version: version,
                found_version,
            });
        }
        log::trace!(target: "format", "opened {} v{} ({} bytes)", magic, version, data.len());
        Ok(Self {
            cursor,
            failed: false,
        })
    }

    /// Continues reading at `pos`, which must be a chunk boundary obtained from
    /// [`ChunkReader::position`] on the same data.
    pub fn resume(data: &'a [u8], pos: usize) -> Self {
        let mut cursor = ByteCursor::new(data);
        cursor.set_pos(pos);
        Self {
            cursor,
            failed: false,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.cursor.pos()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cursor.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cursor.is_empty()
    }

    #[inline]
    pub fn eof(&self) -> bool {
        self.failed || self.cursor.eof()
    }

    pub fn next_chunk(&mut self) -> Option<Result<ChunkRecord<'a>, FormatError>> {
        if self.eof() {
            return None;
        }
        let header_at = self.cursor.pos();
        let tag = ChunkTag::from_slice(self.cursor.read_bytes(4));
        let size = self.cursor.read_u32_le();
        if !tag.is_well_formed() {
            self.failed = true;
            return Some(Err(FormatError::CorruptStream {
                offset: header_at,
                tag,
            }));
        }
        let offset = self.cursor.pos();
        let payload = self.cursor.take(size as usize);
        let record = ChunkRecord {
            tag,
            size,
            offset,
            payload,
        };
        if record.is_truncated() {
            log::warn!(
                target: "format",
                "chunk {} at {} declares {} bytes but only {} remain",
                tag,
                offset,
                size,
                payload.len()
            );
        }
        Some(Ok(record))
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<ChunkRecord<'a>, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk()
    }
}

impl std::iter::FusedIterator for ChunkReader<'_> {}
