//! Packed RGBA texture atlas of all map tiles.
//!
//! Tile `t` occupies the 64x64 cell at `(t % 32 * 64, t / 32 * 64)` of a
//! 2048x2048 image. Every pixel depends only on its own palette index, so the
//! atlas can be filled one tile per step ([`AtlasBuilder::step`]) or all at
//! once across a thread pool ([`AtlasBuilder::build_parallel`]); both produce
//! the same bytes.

use std::sync::Arc;

use hashbrown::HashMap;
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::style::StyleData;

pub const ATLAS_SIZE: usize = 2048;
pub const TILE_SIZE: usize = 64;
pub const ATLAS_COLUMNS: usize = ATLAS_SIZE / TILE_SIZE;
pub const MAX_ATLAS_TILES: usize = 992;

const BYTES_PER_PIXEL: usize = 4;
const ROW_BYTES: usize = ATLAS_SIZE * BYTES_PER_PIXEL;

/// Placement of one tile in the atlas, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AtlasTile {
    pub tile_id: u16,
    pub atlas_x: u32,
    pub atlas_y: u32,
}

impl AtlasTile {
    pub fn for_tile(tile_id: u16) -> Self {
        let t = usize::from(tile_id);
        Self {
            tile_id,
            atlas_x: ((t % ATLAS_COLUMNS) * TILE_SIZE) as u32,
            atlas_y: ((t / ATLAS_COLUMNS) * TILE_SIZE) as u32,
        }
    }

    /// Top-left corner in normalised atlas coordinates.
    pub fn uv_offset(&self) -> (f32, f32) {
        (
            self.atlas_x as f32 / ATLAS_SIZE as f32,
            self.atlas_y as f32 / ATLAS_SIZE as f32,
        )
    }
}

/// RGBA8 atlas bitmap plus its tile placements.
#[derive(Clone, Debug)]
pub struct TextureAtlas {
    pixels: Vec<u8>,
    tiles: HashMap<u16, AtlasTile>,
}

impl TextureAtlas {
    fn blank() -> Self {
        Self {
            pixels: vec![0; ATLAS_SIZE * ROW_BYTES],
            tiles: HashMap::new(),
        }
    }

    pub fn width(&self) -> usize {
        ATLAS_SIZE
    }

    pub fn height(&self) -> usize {
        ATLAS_SIZE
    }

    /// Row-major RGBA8 bytes.
    pub fn rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.pixels
    }

    pub fn tile(&self, id: u16) -> Option<&AtlasTile> {
        self.tiles.get(&id)
    }

    pub fn tiles(&self) -> &HashMap<u16, AtlasTile> {
        &self.tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        if x >= ATLAS_SIZE || y >= ATLAS_SIZE {
            return [0; 4];
        }
        let i = y * ROW_BYTES + x * BYTES_PER_PIXEL;
        match self.pixels.get(i..i + BYTES_PER_PIXEL) {
            Some(p) => [p[0], p[1], p[2], p[3]],
            None => [0; 4],
        }
    }
}

/// Fills tile `tile` into `band`, the 64 atlas rows holding its cell.
fn write_tile(style: &StyleData, tile: usize, band: &mut [u8]) {
    let x0 = (tile % ATLAS_COLUMNS) * TILE_SIZE * BYTES_PER_PIXEL;
    for py in 0..TILE_SIZE {
        let row = py * ROW_BYTES + x0;
        for px in 0..TILE_SIZE {
            let at = row + px * BYTES_PER_PIXEL;
            band[at..at + BYTES_PER_PIXEL].copy_from_slice(&style.tile_rgba(tile, px, py));
        }
    }
}

/// Builds a [`TextureAtlas`] one tile per step, in tile order.
#[derive(Debug)]
pub struct AtlasBuilder {
    style: Arc<StyleData>,
    next: usize,
    total: usize,
    atlas: TextureAtlas,
}

impl AtlasBuilder {
    pub fn new(style: Arc<StyleData>) -> Self {
        let total = style.tile_count().min(MAX_ATLAS_TILES);
        if style.tile_count() > MAX_ATLAS_TILES {
            log::warn!(
                target: "style",
                "{} tiles present, atlas holds {}",
                style.tile_count(),
                MAX_ATLAS_TILES
            );
        }
        Self {
            style,
            next: 0,
            total,
            atlas: TextureAtlas::blank(),
        }
    }

    /// Tiles the atlas will hold.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn done(&self) -> usize {
        self.next
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.total
    }

    /// Decodes the next tile into the atlas; returns its id, or `None` when finished.
    pub fn step(&mut self) -> Option<u16> {
        if self.is_done() {
            return None;
        }
        let tile = self.next;
        let band_start = (tile / ATLAS_COLUMNS) * TILE_SIZE * ROW_BYTES;
        let band = &mut self.atlas.pixels[band_start..band_start + TILE_SIZE * ROW_BYTES];
        write_tile(&self.style, tile, band);
        let id = tile as u16;
        self.atlas.tiles.insert(id, AtlasTile::for_tile(id));
        self.next += 1;
        Some(id)
    }

    /// Runs any remaining steps and returns the atlas.
    pub fn finish(mut self) -> TextureAtlas {
        while self.step().is_some() {}
        self.atlas
    }

    /// Decodes every tile at once, one cell row per task. Runs on `pool` when
    /// given, otherwise on rayon's global pool.
    pub fn build_parallel(style: &StyleData, pool: Option<&ThreadPool>) -> TextureAtlas {
        let total = style.tile_count().min(MAX_ATLAS_TILES);
        let mut atlas = TextureAtlas::blank();
        let fill = |pixels: &mut Vec<u8>| {
            pixels
                .par_chunks_mut(TILE_SIZE * ROW_BYTES)
                .enumerate()
                .for_each(|(row, band)| {
                    let first = row * ATLAS_COLUMNS;
                    for tile in first..(first + ATLAS_COLUMNS).min(total) {
                        write_tile(style, tile, band);
                    }
                });
        };
        match pool {
            Some(pool) => pool.install(|| fill(&mut atlas.pixels)),
            None => fill(&mut atlas.pixels),
        }
        atlas.tiles = (0..total as u16)
            .map(|id| (id, AtlasTile::for_tile(id)))
            .collect();
        log::debug!(target: "style", "parallel atlas: {} tiles", total);
        atlas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_placement() {
        assert_eq!(AtlasTile::for_tile(0).uv_offset(), (0.0, 0.0));
        let t = AtlasTile::for_tile(31);
        assert_eq!((t.atlas_x, t.atlas_y), (1984, 0));
        let t = AtlasTile::for_tile(32);
        assert_eq!((t.atlas_x, t.atlas_y), (0, 64));
        let t = AtlasTile::for_tile(991);
        assert_eq!((t.atlas_x, t.atlas_y), (1984, 1920));
        assert_eq!(t.uv_offset(), (31.0 * 64.0 / 2048.0, 30.0 * 64.0 / 2048.0));
    }

    #[test]
    fn empty_style_builds_blank_atlas() {
        let mut b = AtlasBuilder::new(Arc::new(StyleData::default()));
        assert_eq!(b.total(), 0);
        assert_eq!(b.step(), None);
        let atlas = b.finish();
        assert_eq!(atlas.rgba().len(), 2048 * 2048 * 4);
        assert_eq!(atlas.tile_count(), 0);
        assert_eq!(atlas.pixel(5000, 0), [0; 4]);
    }
}
