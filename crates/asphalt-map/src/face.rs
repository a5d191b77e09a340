//! Packed 16-bit block face codes.

const TEXTURE_MASK: u16 = 0x03FF;
const SHADE_SHIFT: u16 = 10;
const SHADE_MASK: u16 = 0x3;
const FLAT_BIT: u16 = 0x1000;
const FLIP_BIT: u16 = 0x2000;
const ROTATION_SHIFT: u16 = 14;

/// Texture id that marks "no texture" alongside `0`.
pub const TEXTURE_SENTINEL: u16 = 0x03FF;
/// Highest texture id that maps to an atlas cell.
pub const MAX_TEXTURE: u16 = 992;

/// One block face, unpacked once at parse time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FaceCode {
    /// Tile id, bits 0-9.
    pub texture: u16,
    /// Lighting level, bits 10-11. Carried for round-tripping only.
    pub shade: u8,
    /// Bit 12: the face is drawn flat against its opposite wall.
    pub flat: bool,
    /// Bit 13: mirror the texture.
    pub flip: bool,
    /// Bits 14-15: clockwise quarter turns.
    pub rotation: u8,
}

impl FaceCode {
    pub const NONE: FaceCode = FaceCode {
        texture: 0,
        shade: 0,
        flat: false,
        flip: false,
        rotation: 0,
    };

    #[inline]
    pub fn decode(raw: u16) -> Self {
        Self {
            texture: raw & TEXTURE_MASK,
            shade: ((raw >> SHADE_SHIFT) & SHADE_MASK) as u8,
            flat: raw & FLAT_BIT != 0,
            flip: raw & FLIP_BIT != 0,
            rotation: (raw >> ROTATION_SHIFT) as u8,
        }
    }

    #[inline]
    pub fn encode(self) -> u16 {
        (self.texture & TEXTURE_MASK)
            | ((u16::from(self.shade) & SHADE_MASK) << SHADE_SHIFT)
            | if self.flat { FLAT_BIT } else { 0 }
            | if self.flip { FLIP_BIT } else { 0 }
            | ((u16::from(self.rotation) & 0x3) << ROTATION_SHIFT)
    }

    /// Texture id if the face should be drawn: not `0`, not the sentinel, not past the atlas.
    #[inline]
    pub fn texture_id(&self) -> Option<u16> {
        match self.texture {
            0 | TEXTURE_SENTINEL => None,
            t if t > MAX_TEXTURE => None,
            t => Some(t),
        }
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.texture_id().is_some()
    }

    #[inline]
    pub fn rotation_degrees(&self) -> u16 {
        u16::from(self.rotation) * 90
    }

    /// Same face with the flip bit inverted.
    #[inline]
    pub fn flipped(self) -> Self {
        Self {
            flip: !self.flip,
            ..self
        }
    }
}

impl From<u16> for FaceCode {
    fn from(raw: u16) -> Self {
        FaceCode::decode(raw)
    }
}
