//! Structured binary reading for chunked game asset containers.
//!
//! [`ByteCursor`] is a lenient typed reader over an immutable byte slice,
//! [`StructLayout`] drives it from a static field table, and [`ChunkReader`]
//! walks the `(tag, size, payload)` records of a container after validating
//! its header.
#![forbid(unsafe_code)]

pub mod chunk;
pub mod cursor;
pub mod error;
pub mod layout;
pub mod writer;

pub use chunk::{ChunkReader, ChunkRecord, ChunkTag};
pub use cursor::ByteCursor;
pub use error::FormatError;
pub use layout::{Field, FieldKind, FieldValue, FromRecord, Record, StructLayout};
pub use writer::{ContainerWriter, PayloadWriter};
