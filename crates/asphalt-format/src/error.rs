use std::fmt;

use crate::chunk::ChunkTag;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatError {
    /// Header magic or version differ from what the caller expects.
    FormatMismatch {
        expected_magic: ChunkTag,
        found_magic: ChunkTag,
        expected_version: u16,
        found_version: u16,
    },
    /// A chunk tag is not four uppercase ASCII letters. Every later offset is unreliable.
    CorruptStream { offset: usize, tag: ChunkTag },
    /// A caller asserted on bytes that lie past the end of input.
    OutOfRangeRead {
        offset: usize,
        wanted: usize,
        available: usize,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::FormatMismatch {
                expected_magic,
                found_magic,
                expected_version,
                found_version,
            } => write!(
                f,
                "format mismatch: expected {} v{}, found {} v{}",
                expected_magic, expected_version, found_magic, found_version
            ),
            FormatError::CorruptStream { offset, tag } => write!(
                f,
                "corrupt chunk stream at offset {}: bad chunk tag {:?}",
                offset, tag
            ),
            FormatError::OutOfRangeRead {
                offset,
                wanted,
                available,
            } => write!(
                f,
                "read of {} bytes at offset {} runs past end ({} available)",
                wanted, offset, available
            ),
        }
    }
}

impl std::error::Error for FormatError {}
