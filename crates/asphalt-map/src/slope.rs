//! Slope classification from the 6-bit slope code.

/// Shape family of a block's lid. The payload is the index within the family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SlopeClass {
    #[default]
    Flat,
    /// Codes 1-8: ramps rising over two blocks.
    Ramp2(u8),
    /// Codes 9-40: ramps rising over eight blocks.
    Ramp8(u8),
    /// Codes 41-44: one-block steep ramps.
    Steep(u8),
    /// Codes 45-48: the lid is a triangle; payload is the quadrant.
    Diagonal(u8),
}

impl SlopeClass {
    /// Classifies a raw slope code (`slope_type >> 2`). Unknown codes are flat.
    pub fn from_code(code: u8) -> Self {
        match code {
            1..=8 => SlopeClass::Ramp2(code - 1),
            9..=40 => SlopeClass::Ramp8(code - 9),
            41..=44 => SlopeClass::Steep(code - 41),
            45..=48 => SlopeClass::Diagonal((code - 45) % 4),
            _ => SlopeClass::Flat,
        }
    }

    /// `(level_index, num_levels)` for lid construction. Diagonals and flat
    /// blocks have a level lid.
    pub fn lid_params(self) -> (u8, u8) {
        match self {
            SlopeClass::Ramp2(i) => (i, 2),
            SlopeClass::Ramp8(i) => (i, 8),
            SlopeClass::Steep(i) => (i, 1),
            SlopeClass::Flat | SlopeClass::Diagonal(_) => (0, 0),
        }
    }

    #[inline]
    pub fn is_diagonal(self) -> bool {
        matches!(self, SlopeClass::Diagonal(_))
    }
}
