//! Block geometry synthesis and tiled mesh assembly.
//!
//! Coordinates are right-handed with z up: x grows east, y grows south (map
//! rows), and a block at grid `(x, y, z)` spans `[x, x+1] x [y, y+1]` with its
//! flat lid at `z` and its walls reaching down to `z - 1`.
#![forbid(unsafe_code)]

pub mod geometry;
pub mod lid;
pub mod tiles;
pub mod uv;

pub use geometry::{FacePolygon, FaceSide, Vertex, block_geometry, block_geometry_into};
pub use lid::{Lid, construct_lid};
pub use tiles::{
    DEFAULT_MAX_VERTICES_PER_TILE, MESH_TILE_CELLS, MESH_TILES_PER_SIDE, MeshTile,
    TiledMeshAssembler,
};
pub use uv::{BASE_TEXCOORDS, TEXEL_INSET, TILE_SPAN, atlas_offset, face_texcoord};
