//! Per-block face polygons.
//!
//! Square blocks emit up to five quads in the order bottom, top, left, right,
//! lid. Diagonal blocks emit a lid triangle and at most one wall quad along
//! the diagonal. Faces whose texture is not drawable are skipped.

use asphalt_geom::{Vec2, Vec3};
use asphalt_map::{BlockRecord, FaceCode, SlopeClass};

use crate::lid::Lid;
use crate::uv::{BASE_TEXCOORDS, face_texcoord};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub texcoord: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceSide {
    Bottom,
    Top,
    Left,
    Right,
    Lid,
}

/// A textured triangle or quad in block-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FacePolygon {
    pub side: FaceSide,
    corners: [Vertex; 4],
    len: u8,
}

impl FacePolygon {
    /// Builds a face from matching position and base-texcoord lists, or
    /// `None` if the face has no drawable texture.
    fn textured<const N: usize>(
        side: FaceSide,
        face: FaceCode,
        positions: [Vec3; N],
        texcoords: [Vec2; N],
    ) -> Option<FacePolygon> {
        face.texture_id()?;
        let mut corners = [Vertex::default(); 4];
        for i in 0..N {
            corners[i] = Vertex {
                position: positions[i],
                texcoord: face_texcoord(&face, texcoords[i]),
            };
        }
        Some(FacePolygon {
            side,
            corners,
            len: N as u8,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.corners[..usize::from(self.len)]
    }

    #[inline]
    pub fn is_triangle(&self) -> bool {
        self.len == 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        usize::from(self.len) - 2
    }

    /// Triangle-list vertices: quads split as `(0,1,2) (0,2,3)`.
    pub fn triangles(&self) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        let c = &self.corners;
        (0..self.triangle_count()).map(move |t| [c[0], c[t + 1], c[t + 2]])
    }

    /// Moves every corner by `offset`.
    pub fn translated(mut self, offset: Vec3) -> FacePolygon {
        for v in &mut self.corners[..usize::from(self.len)] {
            v.position += offset;
        }
        self
    }
}

#[derive(Clone, Copy)]
struct Wall {
    face: FaceCode,
    pos: [Vec3; 4],
}

impl Wall {
    fn new(face: FaceCode, lower: [(f32, f32); 2], lid: &Lid, upper: [usize; 2]) -> Self {
        let down = |(x, y): (f32, f32)| Vec3::new(x, y, -1.0);
        Wall {
            face,
            pos: [down(lower[0]), down(lower[1]), lid.corner(upper[0]), lid.corner(upper[1])],
        }
    }
}

/// Draws a visible wall at its flat opposite's position, once per pair.
fn substitute_flat(a: &mut Wall, b: &mut Wall) {
    if a.face.flat && !b.face.flat && b.face.is_visible() {
        b.pos = a.pos;
        b.face.flat = true;
        b.face = b.face.flipped();
        a.face = FaceCode::NONE;
    } else if b.face.flat && !a.face.flat && a.face.is_visible() {
        a.pos = b.pos;
        a.face.flat = true;
        a.face = a.face.flipped();
        b.face = FaceCode::NONE;
    }
}

fn square_block(block: &BlockRecord, lid: &Lid, out: &mut Vec<FacePolygon>) {
    let mut bottom = Wall::new(block.bottom, [(0.0, 0.0), (1.0, 0.0)], lid, [1, 0]);
    let mut top = Wall::new(block.top, [(1.0, 1.0), (0.0, 1.0)], lid, [3, 2]);
    let mut left = Wall::new(block.left, [(0.0, 1.0), (0.0, 0.0)], lid, [0, 3]);
    let mut right = Wall::new(block.right, [(1.0, 0.0), (1.0, 1.0)], lid, [2, 1]);

    substitute_flat(&mut top, &mut bottom);
    substitute_flat(&mut right, &mut left);

    let walls = [
        (FaceSide::Bottom, bottom),
        (FaceSide::Top, top),
        (FaceSide::Left, left),
        (FaceSide::Right, right),
    ];
    for (side, wall) in walls {
        out.extend(FacePolygon::textured(side, wall.face, wall.pos, BASE_TEXCOORDS));
    }
    out.extend(FacePolygon::textured(
        FaceSide::Lid,
        block.lid,
        lid.corners,
        BASE_TEXCOORDS,
    ));
}

/// Lid corners kept per diagonal quadrant.
const DIAGONAL_LID: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [1, 2, 3], [0, 2, 3]];
/// First lid corner of the diagonal wall per quadrant.
const DIAGONAL_WALL_START: [usize; 4] = [0, 1, 3, 2];

/// Lid triangle for the quadrant, plus at most one wall: a quad from lid corners
/// `k` and `k + 2` down to `z = -1`, textured with the first visible side face.
fn diagonal_block(block: &BlockRecord, quadrant: u8, lid: &Lid, out: &mut Vec<FacePolygon>) {
    let q = usize::from(quadrant % 4);
    let keep = DIAGONAL_LID[q];
    out.extend(FacePolygon::textured(
        FaceSide::Lid,
        block.lid,
        keep.map(|i| lid.corner(i)),
        keep.map(|i| BASE_TEXCOORDS[i]),
    ));

    let candidates = [
        (FaceSide::Top, block.top),
        (FaceSide::Right, block.right),
        (FaceSide::Bottom, block.bottom),
        (FaceSide::Left, block.left),
    ];
    let Some(&(side, face)) = candidates.iter().find(|(_, f)| f.is_visible()) else {
        return;
    };
    let k = DIAGONAL_WALL_START[q];
    let a = lid.corner(k);
    let b = lid.corner(k + 2);
    let mut pos = [a.with_z(-1.0), b.with_z(-1.0), b, a];
    if k % 2 == 0 {
        pos.reverse();
    }
    out.extend(FacePolygon::textured(side, face, pos, BASE_TEXCOORDS));
}

/// Appends the block's faces, in block-local coordinates, to `out`.
pub fn block_geometry_into(block: &BlockRecord, out: &mut Vec<FacePolygon>) {
    let lid = Lid::for_slope(block.slope);
    match block.slope {
        SlopeClass::Diagonal(q) => diagonal_block(block, q, &lid, out),
        _ => square_block(block, &lid, out),
    }
}

pub fn block_geometry(block: &BlockRecord) -> Vec<FacePolygon> {
    let mut out = Vec::with_capacity(5);
    block_geometry_into(block, &mut out);
    out
}
