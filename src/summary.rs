//! A headless [`RenderSink`]: tallies what a renderer would upload.

use std::io::{self, Write};

use asphalt_map::Light;
use asphalt_mesh::MeshTile;
use asphalt_runtime::RenderSink;
use asphalt_style::TextureAtlas;
use hashbrown::HashMap;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetTotals {
    pub mesh_tiles: usize,
    pub vertices: usize,
    pub dropped_blocks: usize,
    pub lights: usize,
    pub atlas_tiles: usize,
}

#[derive(Debug, Default)]
pub struct SummarySink {
    totals: HashMap<String, AssetTotals>,
    keep_atlas: bool,
    atlas: Option<TextureAtlas>,
}

impl SummarySink {
    /// Holds on to the last atlas delivered so it can be written out later.
    pub fn keeping_atlas() -> Self {
        Self {
            keep_atlas: true,
            ..Self::default()
        }
    }

    pub fn totals(&self, name: &str) -> Option<&AssetTotals> {
        self.totals.get(name)
    }

    pub fn kept_atlas(&self) -> Option<&TextureAtlas> {
        self.atlas.as_ref()
    }

    pub fn report(&self) {
        let mut names: Vec<&String> = self.totals.keys().collect();
        names.sort();
        for name in names {
            let t = &self.totals[name];
            log::info!(
                target: "app",
                "{}: {} mesh tiles, {} vertices, {} dropped blocks, {} lights, {} atlas tiles",
                name,
                t.mesh_tiles,
                t.vertices,
                t.dropped_blocks,
                t.lights,
                t.atlas_tiles
            );
        }
    }

    fn entry(&mut self, name: &str) -> &mut AssetTotals {
        self.totals.entry(name.to_string()).or_default()
    }
}

impl RenderSink for SummarySink {
    fn mesh_tiles(&mut self, name: &str, tiles: &[MeshTile]) {
        let t = self.entry(name);
        t.mesh_tiles += tiles.len();
        for tile in tiles {
            t.vertices += tile.vertex_count();
            t.dropped_blocks += tile.dropped_blocks;
        }
    }

    fn atlas(&mut self, name: &str, atlas: &TextureAtlas) {
        self.entry(name).atlas_tiles += atlas.tile_count();
        if self.keep_atlas {
            self.atlas = Some(atlas.clone());
        }
    }

    fn lights(&mut self, name: &str, lights: &[Light]) {
        self.entry(name).lights += lights.len();
    }
}

/// Writes the atlas as a binary PAM (`P7`, RGB_ALPHA) image.
pub fn write_pam(out: &mut impl Write, atlas: &TextureAtlas) -> io::Result<()> {
    write!(
        out,
        "P7\nWIDTH {}\nHEIGHT {}\nDEPTH 4\nMAXVAL 255\nTUPLTYPE RGB_ALPHA\nENDHDR\n",
        atlas.width(),
        atlas.height()
    )?;
    out.write_all(atlas.rgba())
}

#[cfg(test)]
mod tests {
    use super::*;
    use asphalt_style::{AtlasBuilder, StyleData};

    #[test]
    fn totals_accumulate_per_name() {
        let mut sink = SummarySink::default();
        let tile = MeshTile {
            positions: vec![0.0; 9 * 3],
            dropped_blocks: 2,
            ..MeshTile::default()
        };
        sink.mesh_tiles("map", &[tile.clone(), tile]);
        sink.lights("map", &[Light::default()]);
        let t = sink.totals("map").unwrap();
        assert_eq!((t.mesh_tiles, t.vertices, t.dropped_blocks, t.lights), (2, 18, 4, 1));
        assert!(sink.totals("style").is_none());
    }

    #[test]
    fn pam_header_precedes_pixels() {
        let atlas = AtlasBuilder::build_parallel(&StyleData::default(), None);
        let mut sink = SummarySink::keeping_atlas();
        sink.atlas("style", &atlas);
        assert_eq!(sink.totals("style").unwrap().atlas_tiles, 0);

        let mut out = Vec::new();
        write_pam(&mut out, sink.kept_atlas().unwrap()).unwrap();
        let header = b"P7\nWIDTH 2048\nHEIGHT 2048\nDEPTH 4\nMAXVAL 255\nTUPLTYPE RGB_ALPHA\nENDHDR\n";
        assert!(out.starts_with(header));
        assert_eq!(out.len(), header.len() + 2048 * 2048 * 4);
    }
}
