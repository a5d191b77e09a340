//! Decoding of the map container's `DMAP` and `LGHT` chunks.

use std::fmt;

use asphalt_format::{ByteCursor, ChunkReader, ChunkRecord, ChunkTag, FormatError, FromRecord};

use crate::DIRECTORY_LEN;
use crate::block::{BlockRecord, Light};

pub const MAP_CHUNK_DMAP: ChunkTag = ChunkTag::new(b"DMAP");
pub const MAP_CHUNK_LGHT: ChunkTag = ChunkTag::new(b"LGHT");

/// Unit of the column-data length and of directory offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColumnUnits {
    #[default]
    Bytes,
    /// 32-bit words, as in the retail files.
    Words,
}

impl ColumnUnits {
    #[inline]
    pub fn scale(self) -> usize {
        match self {
            ColumnUnits::Bytes => 1,
            ColumnUnits::Words => 4,
        }
    }
}

/// Decoded map container: the `DMAP` tables plus any lights.
#[derive(Clone, Debug, Default)]
pub struct MapData {
    /// One column offset per cell, in `units`.
    pub directory: Vec<u32>,
    pub column_bytes: Vec<u8>,
    pub blocks: Vec<BlockRecord>,
    pub lights: Vec<Light>,
    pub units: ColumnUnits,
}

impl MapData {
    /// Byte offset into `column_bytes` for the cell at `index`, if the
    /// directory holds that entry.
    #[inline]
    pub fn column_offset(&self, index: usize) -> Option<usize> {
        self.directory
            .get(index)
            .map(|&o| o as usize * self.units.scale())
    }

    /// Decodes a whole map container in one go.
    pub fn parse(
        data: &[u8],
        magic: ChunkTag,
        version: u16,
        units: ColumnUnits,
    ) -> Result<MapData, MapError> {
        let mut builder = MapDataBuilder::new(units);
        for chunk in ChunkReader::open(data, magic, version)? {
            builder.accept(chunk?);
        }
        builder.finish().ok_or(MapError::MissingDmap)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapError {
    Format(FormatError),
    /// The container held no `DMAP` chunk.
    MissingDmap,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Format(e) => write!(f, "{}", e),
            MapError::MissingDmap => write!(f, "map container has no {} chunk", MAP_CHUNK_DMAP),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Format(e) => Some(e),
            MapError::MissingDmap => None,
        }
    }
}

impl From<FormatError> for MapError {
    fn from(e: FormatError) -> Self {
        MapError::Format(e)
    }
}

/// Accumulates map chunks one at a time.
#[derive(Debug, Default)]
pub struct MapDataBuilder {
    units: ColumnUnits,
    dmap: Option<(Vec<u32>, Vec<u8>, Vec<BlockRecord>)>,
    lights: Vec<Light>,
}

impl MapDataBuilder {
    pub fn new(units: ColumnUnits) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    /// Consumes one chunk. Returns false when the tag was not recognised.
    pub fn accept(&mut self, chunk: ChunkRecord<'_>) -> bool {
        let mut payload = chunk.payload;
        match chunk.tag {
            MAP_CHUNK_DMAP => {
                if self.dmap.is_some() {
                    log::warn!(target: "map", "second {} chunk at {} replaces the first", chunk.tag, chunk.offset);
                }
                self.dmap = Some(decode_dmap(&mut payload, self.units));
                true
            }
            MAP_CHUNK_LGHT => {
                let count = payload.len() / Light::LAYOUT.size();
                self.lights.extend(payload.read_structs::<Light>(count));
                log::debug!(target: "map", "{} lights", count);
                true
            }
            tag => {
                log::debug!(target: "map", "skipping {} chunk ({} bytes)", tag, chunk.size);
                false
            }
        }
    }

    /// The decoded map, or `None` if no `DMAP` chunk was seen.
    pub fn finish(self) -> Option<MapData> {
        let (directory, column_bytes, blocks) = self.dmap?;
        Some(MapData {
            directory,
            column_bytes,
            blocks,
            lights: self.lights,
            units: self.units,
        })
    }
}

fn decode_dmap(c: &mut ByteCursor<'_>, units: ColumnUnits) -> (Vec<u32>, Vec<u8>, Vec<BlockRecord>) {
    let directory = c.read_u32_array_le(DIRECTORY_LEN * 4);
    let column_len = c.read_u32_le() as usize * units.scale();
    let column_bytes = c.read_u8_array(column_len);
    let block_count = c.read_u32_le() as usize;
    let blocks = c.read_structs::<BlockRecord>(block_count);
    if directory.len() < DIRECTORY_LEN || column_bytes.len() < column_len || blocks.len() < block_count || c.remaining() > 0 {
        log::debug!(
            target: "map",
            "DMAP layout: {} directory entries, {}/{} column bytes, {} blocks, {} trailing bytes",
            directory.len(),
            column_bytes.len(),
            column_len,
            blocks.len(),
            c.remaining()
        );
    }
    log::info!(
        target: "map",
        "decoded DMAP: {} column bytes, {} blocks",
        column_bytes.len(),
        blocks.len()
    );
    (directory, column_bytes, blocks)
}
