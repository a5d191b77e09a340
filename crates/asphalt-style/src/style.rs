//! `GBST` style container: palettes, tile pixels, sprite data.

use asphalt_format::{ChunkReader, ChunkRecord, ChunkTag, FormatError};

use crate::atlas::TILE_SIZE;
use crate::palette::{PaletteBase, argb_to_rgba, physical_index};

/// Bytes per 256x256 page of tiles.
const TILE_PAGE: usize = 256 * 256;
/// Tiles per page side.
const TILES_PER_PAGE_ROW: usize = 4;

#[derive(Clone, Debug, Default)]
pub struct StyleData {
    /// `PALX`: virtual palette -> physical palette.
    pub palette_index: Vec<u16>,
    /// `PPAL`: physical palettes, packed ARGB.
    pub physical_palettes: Vec<u32>,
    /// `PALB`.
    pub palette_base: PaletteBase,
    /// `TILE`: 8-bit palette indices, 4x4 tiles per 256x256 page.
    pub tiles: Vec<u8>,
    /// `SPRG`: sprite pixel indices.
    pub sprite_graphics: Vec<u8>,
    /// `SPRX`: sprite index entries.
    pub sprite_index: Vec<u8>,
    /// `SPRB`: sprite bases.
    pub sprite_bases: Vec<u8>,
}

impl StyleData {
    pub fn parse(data: &[u8], magic: ChunkTag, version: u16) -> Result<StyleData, FormatError> {
        let mut builder = StyleDataBuilder::default();
        for chunk in ChunkReader::open(data, magic, version)? {
            builder.accept(chunk?);
        }
        Ok(builder.finish())
    }

    /// Whole tiles present in the `TILE` data.
    pub fn tile_count(&self) -> usize {
        self.tiles.len() / (TILE_SIZE * TILE_SIZE)
    }

    /// Palette index of pixel `(px, py)` of `tile`; 0 when out of range.
    #[inline]
    pub fn tile_pixel(&self, tile: usize, px: usize, py: usize) -> u8 {
        let page = tile / 16;
        let slot = tile % 16;
        let row = (slot / TILES_PER_PAGE_ROW) * TILE_SIZE + py;
        let col = (slot % TILES_PER_PAGE_ROW) * TILE_SIZE + px;
        self.tiles
            .get(page * TILE_PAGE + row * 256 + col)
            .copied()
            .unwrap_or(0)
    }

    /// Physical palette assigned to `tile` through the tile palette base.
    #[inline]
    pub fn tile_palette(&self, tile: usize) -> usize {
        let virt = usize::from(self.palette_base.tile) + tile;
        self.palette_index.get(virt).map_or(0, |&p| usize::from(p))
    }

    /// Packed ARGB of colour `color` in physical palette `palette`; 0 when missing.
    #[inline]
    pub fn palette_color(&self, palette: usize, color: u8) -> u32 {
        self.physical_palettes
            .get(physical_index(palette, usize::from(color)))
            .copied()
            .unwrap_or(0)
    }

    /// RGBA of pixel `(px, py)` of `tile`.
    #[inline]
    pub fn tile_rgba(&self, tile: usize, px: usize, py: usize) -> [u8; 4] {
        let index = self.tile_pixel(tile, px, py);
        if index == 0 {
            return [0; 4];
        }
        argb_to_rgba(index, self.palette_color(self.tile_palette(tile), index))
    }
}

const PALX: ChunkTag = ChunkTag::new(b"PALX");
const PPAL: ChunkTag = ChunkTag::new(b"PPAL");
const PALB: ChunkTag = ChunkTag::new(b"PALB");
const TILE: ChunkTag = ChunkTag::new(b"TILE");
const SPRG: ChunkTag = ChunkTag::new(b"SPRG");
const SPRX: ChunkTag = ChunkTag::new(b"SPRX");
const SPRB: ChunkTag = ChunkTag::new(b"SPRB");

#[derive(Debug, Default)]
pub struct StyleDataBuilder {
    style: StyleData,
    seen_tiles: bool,
}

impl StyleDataBuilder {
    /// Consumes one chunk. Returns false when the tag was not recognised.
    pub fn accept(&mut self, chunk: ChunkRecord<'_>) -> bool {
        let mut p = chunk.payload;
        let size = p.len();
        let s = &mut self.style;
        match chunk.tag {
            PALX => s.palette_index = p.read_u16_array_le(size),
            PPAL => s.physical_palettes = p.read_u32_array_le(size),
            PALB => s.palette_base = p.read_struct(),
            TILE => {
                s.tiles = p.read_u8_array(size);
                self.seen_tiles = true;
            }
            SPRG => s.sprite_graphics = p.read_u8_array(size),
            SPRX => s.sprite_index = p.read_u8_array(size),
            SPRB => s.sprite_bases = p.read_u8_array(size),
            tag => {
                log::debug!(
                    target: "style",
                    "skipping {} bytes on {} at offset {}",
                    chunk.size,
                    tag,
                    chunk.offset
                );
                return false;
            }
        }
        log::trace!(target: "style", "{} chunk, {} bytes", chunk.tag, size);
        true
    }

    pub fn has_tiles(&self) -> bool {
        self.seen_tiles
    }

    pub fn finish(self) -> StyleData {
        log::info!(
            target: "style",
            "decoded style: {} tiles, {} virtual palettes, {} physical palette entries",
            self.style.tile_count(),
            self.style.palette_index.len(),
            self.style.physical_palettes.len()
        );
        self.style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_pixels_follow_page_layout() {
        let mut style = StyleData {
            tiles: vec![0; TILE_PAGE * 2],
            ..StyleData::default()
        };
        // tile 5: page 0, slot row 1, slot column 1
        style.tiles[(64 + 3) * 256 + 64 + 2] = 9;
        // tile 17: page 1, slot 1
        style.tiles[TILE_PAGE + 64] = 4;
        assert_eq!(style.tile_pixel(5, 2, 3), 9);
        assert_eq!(style.tile_pixel(17, 0, 0), 4);
        assert_eq!(style.tile_pixel(40, 0, 0), 0);
        assert_eq!(style.tile_count(), 32);
    }

    #[test]
    fn colors_go_through_palette_base() {
        let mut style = StyleData {
            tiles: vec![3; TILE_SIZE * TILE_SIZE],
            palette_index: vec![0, 0, 7],
            physical_palettes: vec![0; 16384],
            palette_base: PaletteBase {
                tile: 2,
                ..PaletteBase::default()
            },
            ..StyleData::default()
        };
        style.physical_palettes[physical_index(7, 3)] = 0x00_11_22_33;
        assert_eq!(style.tile_palette(0), 7);
        assert_eq!(style.tile_rgba(0, 10, 10), [0x11, 0x22, 0x33, 0xFF]);
        assert_eq!(style.tile_palette(1), 0);
    }
}
