//! Tiled mesh assembly: one vertex buffer per 32x32 region of the map.

use std::ops::Range;

use asphalt_geom::{Aabb, Vec3};
use asphalt_map::{MAP_SIZE, MAX_Z, ResolvedMap};

use crate::geometry::{FacePolygon, block_geometry_into};

/// Cells per mesh tile side.
pub const MESH_TILE_CELLS: usize = 32;
/// Mesh tiles per map side.
pub const MESH_TILES_PER_SIDE: usize = MAP_SIZE / MESH_TILE_CELLS;
/// Room for every slot of every cell holding a five-quad block.
pub const DEFAULT_MAX_VERTICES_PER_TILE: usize = MESH_TILE_CELLS * MESH_TILE_CELLS * MAX_Z * 30;

/// Non-indexed triangle list for one map region. Frozen once handed out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshTile {
    /// Tile grid coordinates, `0..MESH_TILES_PER_SIDE` on each axis.
    pub tile_x: usize,
    pub tile_y: usize,
    /// `x y z` per vertex.
    pub positions: Vec<f32>,
    /// `u v` per vertex.
    pub texcoords: Vec<f32>,
    /// World-space bounds of every emitted vertex.
    pub bounds: Aabb,
    /// First vertex of each cell row in the tile, plus the final vertex count.
    pub row_starts: Vec<u32>,
    /// Blocks left out because the tile hit its vertex cap.
    pub dropped_blocks: usize,
}

impl MeshTile {
    fn new(tile_x: usize, tile_y: usize) -> Self {
        Self {
            tile_x,
            tile_y,
            bounds: Aabb::EMPTY,
            row_starts: Vec::with_capacity(MESH_TILE_CELLS + 1),
            ..Self::default()
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Vertex range covering cell row `row` (local to the tile), for
    /// drawing only the rows near a viewer.
    pub fn row_range(&self, row: usize) -> Range<u32> {
        match (self.row_starts.get(row), self.row_starts.get(row + 1)) {
            (Some(&a), Some(&b)) => a..b,
            _ => 0..0,
        }
    }

    fn push_polygon(&mut self, poly: &FacePolygon) {
        for tri in poly.triangles() {
            for v in tri {
                let p = v.position;
                self.positions.extend_from_slice(&[p.x, p.y, p.z]);
                self.texcoords.extend_from_slice(&[v.texcoord.x, v.texcoord.y]);
                self.bounds.include(p);
            }
        }
    }
}

/// Builds mesh tiles in row-major tile order, one tile per step.
#[derive(Debug)]
pub struct TiledMeshAssembler {
    map: ResolvedMap,
    next: usize,
    max_vertices: usize,
    tiles: Vec<MeshTile>,
    scratch: Vec<FacePolygon>,
}

impl TiledMeshAssembler {
    pub fn new(map: ResolvedMap) -> Self {
        Self::with_max_vertices(map, DEFAULT_MAX_VERTICES_PER_TILE)
    }

    pub fn with_max_vertices(map: ResolvedMap, max_vertices: usize) -> Self {
        Self {
            map,
            next: 0,
            max_vertices,
            tiles: Vec::new(),
            scratch: Vec::with_capacity(5),
        }
    }

    /// Tiles the assembler will visit.
    pub fn total(&self) -> usize {
        MESH_TILES_PER_SIDE * MESH_TILES_PER_SIDE
    }

    pub fn done(&self) -> usize {
        self.next
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.total()
    }

    pub fn map(&self) -> &ResolvedMap {
        &self.map
    }

    /// Builds the next tile. Returns its index in row-major order, or `None`
    /// when every tile has been visited. Empty tiles are visited but not kept.
    pub fn step(&mut self) -> Option<usize> {
        if self.is_done() {
            return None;
        }
        let index = self.next;
        let tile = self.build_tile(index % MESH_TILES_PER_SIDE, index / MESH_TILES_PER_SIDE);
        if tile.dropped_blocks > 0 {
            log::warn!(
                target: "mesh",
                "tile ({}, {}) hit the {} vertex cap; {} blocks dropped",
                tile.tile_x,
                tile.tile_y,
                self.max_vertices,
                tile.dropped_blocks
            );
        }
        if !tile.is_empty() {
            self.tiles.push(tile);
        }
        self.next += 1;
        Some(index)
    }

    /// Non-empty tiles built so far.
    pub fn tiles(&self) -> &[MeshTile] {
        &self.tiles
    }

    /// Runs any remaining steps and hands over the non-empty tiles.
    pub fn finish(mut self) -> Vec<MeshTile> {
        while self.step().is_some() {}
        log::debug!(
            target: "mesh",
            "{} mesh tiles, {} triangles",
            self.tiles.len(),
            self.tiles.iter().map(MeshTile::triangle_count).sum::<usize>()
        );
        self.tiles
    }

    pub fn assemble(map: ResolvedMap) -> Vec<MeshTile> {
        TiledMeshAssembler::new(map).finish()
    }

    fn build_tile(&mut self, tile_x: usize, tile_y: usize) -> MeshTile {
        let mut tile = MeshTile::new(tile_x, tile_y);
        let x0 = tile_x * MESH_TILE_CELLS;
        let y0 = tile_y * MESH_TILE_CELLS;
        for y in y0..y0 + MESH_TILE_CELLS {
            tile.row_starts.push(tile.vertex_count() as u32);
            for x in x0..x0 + MESH_TILE_CELLS {
                for (z, index) in self.map.cell(x, y).occupied() {
                    let Some(block) = self.map.blocks().get(index as usize) else {
                        continue;
                    };
                    self.scratch.clear();
                    block_geometry_into(block, &mut self.scratch);
                    let needed: usize = self.scratch.iter().map(|p| p.triangle_count() * 3).sum();
                    if tile.vertex_count() + needed > self.max_vertices {
                        tile.dropped_blocks += 1;
                        continue;
                    }
                    let offset = Vec3::new(x as f32, y as f32, z as f32);
                    for poly in &self.scratch {
                        tile.push_polygon(&poly.translated(offset));
                    }
                }
            }
        }
        tile.row_starts.push(tile.vertex_count() as u32);
        tile
    }
}
