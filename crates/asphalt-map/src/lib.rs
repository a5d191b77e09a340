//! Map data model: DMAP column directory, column records and block records.
#![forbid(unsafe_code)]

pub mod block;
pub mod dmap;
pub mod face;
pub mod resolve;
pub mod slope;

pub use block::{BLOCK_RECORD_LEN, BlockRecord, COLUMN_RECORD_LEN, ColumnRecord, Light};
pub use dmap::{ColumnUnits, MapData, MapDataBuilder, MapError, MAP_CHUNK_DMAP, MAP_CHUNK_LGHT};
pub use face::FaceCode;
pub use resolve::{CellStack, ColumnResolver, DecodeWarning, Reference, ResolvedMap};
pub use slope::SlopeClass;

/// Cells per map side.
pub const MAP_SIZE: usize = 256;
/// Directory entries: one per `(x, y)` cell.
pub const DIRECTORY_LEN: usize = MAP_SIZE * MAP_SIZE;
/// Vertical block slots per cell.
pub const MAX_Z: usize = 8;
