//! Atlas texture coordinates for a face.

use asphalt_geom::Vec2;
use asphalt_map::FaceCode;

/// Width of one 64px cell in a 2048px atlas.
pub const TILE_SPAN: f32 = 1.0 / 32.0;
/// Half a texel; keeps filtering from bleeding into neighbouring cells.
pub const TEXEL_INSET: f32 = 1.0 / 4096.0;

const LO: f32 = TEXEL_INSET;
const HI: f32 = TILE_SPAN - TEXEL_INSET;
const CENTER: Vec2 = Vec2::new(TILE_SPAN / 2.0, TILE_SPAN / 2.0);

/// Inset cell corners matching lid corner order.
pub const BASE_TEXCOORDS: [Vec2; 4] = [
    Vec2::new(LO, LO),
    Vec2::new(HI, LO),
    Vec2::new(HI, HI),
    Vec2::new(LO, HI),
];

/// Top-left of texture `texture`'s atlas cell, normalised.
#[inline]
pub fn atlas_offset(texture: u16) -> Vec2 {
    let t = u32::from(texture);
    Vec2::new(
        (t % 32 * 64) as f32 / 2048.0,
        (t / 32 * 64) as f32 / 2048.0,
    )
}

/// Maps a base texcoord through the face's mirror and rotation into its atlas cell.
///
/// Image rows grow downward, so the unflipped face is mirrored vertically;
/// the flip bit mirrors horizontally as well. Rotation is clockwise.
#[inline]
pub fn face_texcoord(face: &FaceCode, base: Vec2) -> Vec2 {
    let mirror_x = if face.flip { -1.0 } else { 1.0 };
    (base - CENTER)
        .scale(mirror_x, -1.0)
        .rotate_cw_quarters(face.rotation)
        + CENTER
        + atlas_offset(face.texture)
}
