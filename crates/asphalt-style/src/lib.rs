//! Style container decoding and texture atlas construction.
#![forbid(unsafe_code)]

pub mod atlas;
pub mod palette;
pub mod style;

pub use atlas::{
    ATLAS_COLUMNS, ATLAS_SIZE, AtlasBuilder, AtlasTile, MAX_ATLAS_TILES, TILE_SIZE, TextureAtlas,
};
pub use palette::{PaletteBase, argb_to_rgba};
pub use style::{StyleData, StyleDataBuilder};
