//! Fixed-layout records from the `DMAP` and `LGHT` chunks.

use asphalt_format::{Field, FieldKind, FromRecord, Record, StructLayout};

use crate::face::FaceCode;
use crate::slope::SlopeClass;

/// Encoded size of one block record.
pub const BLOCK_RECORD_LEN: usize = BlockRecord::LAYOUT.size();
/// Encoded size of one column record.
pub const COLUMN_RECORD_LEN: usize = ColumnRecord::LAYOUT.size();

/// One voxel's faces and shape. Blocks are deduplicated in the file and shared
/// between every column slot that names the same index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockRecord {
    pub left: FaceCode,
    pub right: FaceCode,
    pub top: FaceCode,
    pub bottom: FaceCode,
    pub lid: FaceCode,
    pub arrows: u8,
    pub slope_type: u8,
    pub slope: SlopeClass,
}

impl BlockRecord {
    /// Six-bit slope code.
    #[inline]
    pub fn slope_code(&self) -> u8 {
        self.slope_type >> 2
    }

    /// True when no face of the block can produce geometry.
    pub fn is_empty(&self) -> bool {
        [self.left, self.right, self.top, self.bottom, self.lid]
            .iter()
            .all(|f| !f.is_visible())
    }
}

impl FromRecord for BlockRecord {
    const LAYOUT: StructLayout = StructLayout::new(&[
        Field::new("left", FieldKind::U16Le),
        Field::new("right", FieldKind::U16Le),
        Field::new("top", FieldKind::U16Le),
        Field::new("bottom", FieldKind::U16Le),
        Field::new("lid", FieldKind::U16Le),
        Field::new("arrows", FieldKind::U8),
        Field::new("slope_type", FieldKind::U8),
    ]);

    fn from_record(r: &Record) -> Self {
        let face = |name| FaceCode::decode(r.int(name) as u16);
        let slope_type = r.int("slope_type") as u8;
        Self {
            left: face("left"),
            right: face("right"),
            top: face("top"),
            bottom: face("bottom"),
            lid: face("lid"),
            arrows: r.int("arrows") as u8,
            slope_type,
            slope: SlopeClass::from_code(slope_type >> 2),
        }
    }
}

/// Vertical stack for one map cell, read from the column data at a directory offset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnRecord {
    /// Exclusive top z of the stack: slots cover z = `offset..height`.
    pub height: u8,
    /// Lowest populated z.
    pub offset: u8,
    /// Block index per slot; slot `i` sits at z = `offset + i`. Short when the
    /// column data ends early.
    pub blocks: Vec<u32>,
}

impl ColumnRecord {
    /// `(z, block index)` for every slot the header declares and the data holds.
    pub fn slots(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        let used = usize::from(self.height.saturating_sub(self.offset));
        self.blocks
            .iter()
            .take(used)
            .enumerate()
            .map(|(i, &b)| (usize::from(self.offset) + i, b))
    }

    /// Slots declared by the header.
    pub fn declared_slots(&self) -> usize {
        usize::from(self.height.saturating_sub(self.offset))
    }
}

impl FromRecord for ColumnRecord {
    const LAYOUT: StructLayout = StructLayout::new(&[
        Field::new("height", FieldKind::U8),
        Field::new("offset", FieldKind::U8),
        Field::new("pad", FieldKind::U16Le),
        Field::new("blocks", FieldKind::U32ArrayLe(32)),
    ]);

    fn from_record(r: &Record) -> Self {
        Self {
            height: r.int("height") as u8,
            offset: r.int("offset") as u8,
            blocks: r.u32s("blocks").to_vec(),
        }
    }
}

/// Converts a 16-bit map fixed-point value to blocks: 9 integer bits
/// (wrapped to the 256-block map) and a 7-bit fraction.
#[inline]
pub fn fixed_point(v: u16) -> f32 {
    let whole = ((v & 0xFF80) >> 7) % 256;
    f32::from(whole) + f32::from(v & 0x7F) / 128.0
}

/// Point light from the `LGHT` chunk. Positions and radius are in blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Light {
    pub argb: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub radius: f32,
    pub intensity: u8,
    pub shape: u8,
    pub on_time: u8,
    pub off_time: u8,
}

impl Light {
    /// `[r, g, b]` in `0..=1`.
    pub fn rgb(&self) -> [f32; 3] {
        let c = |shift: u32| ((self.argb >> shift) & 0xFF) as f32 / 255.0;
        [c(16), c(8), c(0)]
    }
}

impl FromRecord for Light {
    const LAYOUT: StructLayout = StructLayout::new(&[
        Field::new("argb", FieldKind::U32Le),
        Field::new("x", FieldKind::U16Le),
        Field::new("y", FieldKind::U16Le),
        Field::new("z", FieldKind::U16Le),
        Field::new("radius", FieldKind::U16Le),
        Field::new("intensity", FieldKind::U8),
        Field::new("shape", FieldKind::U8),
        Field::new("on_time", FieldKind::U8),
        Field::new("off_time", FieldKind::U8),
    ]);

    fn from_record(r: &Record) -> Self {
        let fx = |name| fixed_point(r.int(name) as u16);
        Self {
            argb: r.int("argb"),
            x: fx("x"),
            y: fx("y"),
            z: fx("z"),
            radius: fx("radius"),
            intensity: r.int("intensity") as u8,
            shape: r.int("shape") as u8,
            on_time: r.int("on_time") as u8,
            off_time: r.int("off_time") as u8,
        }
    }
}
