//! Palette tables: virtual palette index, physical palettes, palette bases.

use asphalt_format::{Field, FieldKind, FromRecord, Record, StructLayout};

/// Physical palettes per 64 KiB page.
const PALETTES_PER_PAGE: usize = 64;
/// `u32` entries per page.
const PAGE_ENTRIES: usize = 16384;

/// Offsets into the virtual palette index, one per content class (`PALB`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaletteBase {
    pub tile: u16,
    pub sprite: u16,
    pub car_remap: u16,
    pub ped_remap: u16,
    pub code_obj_remap: u16,
    pub map_obj_remap: u16,
    pub user_remap: u16,
    pub font_remap: u16,
}

impl FromRecord for PaletteBase {
    const LAYOUT: StructLayout = StructLayout::new(&[
        Field::new("tile", FieldKind::U16Le),
        Field::new("sprite", FieldKind::U16Le),
        Field::new("car_remap", FieldKind::U16Le),
        Field::new("ped_remap", FieldKind::U16Le),
        Field::new("code_obj_remap", FieldKind::U16Le),
        Field::new("map_obj_remap", FieldKind::U16Le),
        Field::new("user_remap", FieldKind::U16Le),
        Field::new("font_remap", FieldKind::U16Le),
    ]);

    fn from_record(r: &Record) -> Self {
        let base = |name| r.int(name) as u16;
        Self {
            tile: base("tile"),
            sprite: base("sprite"),
            car_remap: base("car_remap"),
            ped_remap: base("ped_remap"),
            code_obj_remap: base("code_obj_remap"),
            map_obj_remap: base("map_obj_remap"),
            user_remap: base("user_remap"),
            font_remap: base("font_remap"),
        }
    }
}

/// Index of colour `color` of physical palette `palette` in the `PPAL` table.
#[inline]
pub fn physical_index(palette: usize, color: usize) -> usize {
    (palette / PALETTES_PER_PAGE) * PAGE_ENTRIES + color * PALETTES_PER_PAGE + palette % PALETTES_PER_PAGE
}

/// Expands a palette colour to RGBA. Index 0 is transparent; every other
/// index is forced opaque.
#[inline]
pub fn argb_to_rgba(index: u8, argb: u32) -> [u8; 4] {
    if index == 0 {
        return [0; 4];
    }
    let c = argb | 0xFF00_0000;
    [(c >> 16) as u8, (c >> 8) as u8, c as u8, (c >> 24) as u8]
}
