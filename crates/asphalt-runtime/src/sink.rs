use asphalt_map::Light;
use asphalt_mesh::MeshTile;
use asphalt_style::TextureAtlas;

/// Receiver for finished products; the renderer side of the loader.
pub trait RenderSink {
    fn mesh_tiles(&mut self, name: &str, tiles: &[MeshTile]);

    fn atlas(&mut self, name: &str, atlas: &TextureAtlas);

    fn lights(&mut self, _name: &str, _lights: &[Light]) {}
}
