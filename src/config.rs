use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use asphalt_format::ChunkTag;
use asphalt_map::ColumnUnits;
use asphalt_mesh::DEFAULT_MAX_VERTICES_PER_TILE;
use asphalt_runtime::fetch::DEFAULT_READ_CHUNK;
use asphalt_runtime::{GovernorConfig, MapSettings, StyleSettings};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_log_filter")] pub log_filter: String,
    #[serde(default)] pub assets: Assets,
    #[serde(default)] pub map: Map,
    #[serde(default)] pub style: Style,
    #[serde(default)] pub scheduler: Scheduler,
    #[serde(default)] pub mesh: Mesh,
    #[serde(default)] pub fetch: Fetch,
}

fn default_log_filter() -> String { "info".to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            assets: Assets::default(),
            map: Map::default(),
            style: Style::default(),
            scheduler: Scheduler::default(),
            mesh: Mesh::default(),
            fetch: Fetch::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Assets {
    #[serde(default = "default_root")] pub root: PathBuf,
    #[serde(default = "default_map_file")] pub map: String,
    #[serde(default = "default_style_file")] pub style: String,
}
fn default_root() -> PathBuf { PathBuf::from("data") }
fn default_map_file() -> String { "wil.gmp".to_string() }
fn default_style_file() -> String { "wil.sty".to_string() }
impl Default for Assets {
    fn default() -> Self {
        Self {
            root: default_root(),
            map: default_map_file(),
            style: default_style_file(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units { #[default] Bytes, Words }

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Map {
    #[serde(default = "default_map_magic")] pub magic: String,
    #[serde(default = "default_map_version")] pub version: u16,
    #[serde(default)] pub column_units: Units,
}
fn default_map_magic() -> String { "GBMP".to_string() }
fn default_map_version() -> u16 { 500 }
impl Default for Map {
    fn default() -> Self {
        Self {
            magic: default_map_magic(),
            version: default_map_version(),
            column_units: Units::Bytes,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Style {
    #[serde(default = "default_style_magic")] pub magic: String,
    #[serde(default = "default_style_version")] pub version: u16,
    #[serde(default)] pub parallel_atlas: bool,
    /// Worker threads for the parallel atlas; 0 uses rayon's global pool.
    #[serde(default)] pub threads: usize,
}
fn default_style_magic() -> String { "GBST".to_string() }
fn default_style_version() -> u16 { 700 }
impl Default for Style {
    fn default() -> Self {
        Self {
            magic: default_style_magic(),
            version: default_style_version(),
            parallel_atlas: false,
            threads: 0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Scheduler {
    #[serde(default = "default_target_frame_ms")] pub target_frame_ms: f64,
    #[serde(default = "default_initial_steps")] pub initial_steps: u32,
    #[serde(default = "default_max_steps")] pub max_steps: u32,
    #[serde(default = "default_recalibrate_every")] pub recalibrate_every: u32,
}
fn default_target_frame_ms() -> f64 { 1000.0 / 60.0 }
fn default_initial_steps() -> u32 { 1 }
fn default_max_steps() -> u32 { 1000 }
fn default_recalibrate_every() -> u32 { 8 }
impl Default for Scheduler {
    fn default() -> Self {
        Self {
            target_frame_ms: default_target_frame_ms(),
            initial_steps: default_initial_steps(),
            max_steps: default_max_steps(),
            recalibrate_every: default_recalibrate_every(),
        }
    }
}

impl Scheduler {
    pub fn target_frame(&self) -> Duration {
        Duration::from_secs_f64(self.target_frame_ms.clamp(1.0, 1000.0) / 1000.0)
    }

    pub fn governor(&self) -> GovernorConfig {
        GovernorConfig {
            target_frame: self.target_frame(),
            initial_steps: self.initial_steps,
            max_steps: self.max_steps,
            recalibrate_every: self.recalibrate_every,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Mesh {
    #[serde(default = "default_max_vertices")] pub max_vertices_per_tile: usize,
}
fn default_max_vertices() -> usize { DEFAULT_MAX_VERTICES_PER_TILE }
impl Default for Mesh {
    fn default() -> Self { Self { max_vertices_per_tile: default_max_vertices() } }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Fetch {
    #[serde(default = "default_read_chunk")] pub read_chunk_bytes: usize,
}
fn default_read_chunk() -> usize { DEFAULT_READ_CHUNK }
impl Default for Fetch {
    fn default() -> Self { Self { read_chunk_bytes: default_read_chunk() } }
}

fn tag(magic: &str) -> Result<ChunkTag, String> {
    match magic.as_bytes() {
        &[a, b, c, d] => Ok(ChunkTag::new(&[a, b, c, d])),
        _ => Err(format!("magic must be 4 bytes, got {:?}", magic)),
    }
}

impl AppConfig {
    pub fn map_settings(&self) -> Result<MapSettings, String> {
        Ok(MapSettings {
            magic: tag(&self.map.magic)?,
            version: self.map.version,
            units: match self.map.column_units {
                Units::Bytes => ColumnUnits::Bytes,
                Units::Words => ColumnUnits::Words,
            },
            max_vertices_per_tile: self.mesh.max_vertices_per_tile,
        })
    }

    pub fn style_settings(&self) -> Result<StyleSettings, String> {
        Ok(StyleSettings {
            magic: tag(&self.style.magic)?,
            version: self.style.version,
            parallel_atlas: self.style.parallel_atlas,
        })
    }
}

pub fn load_config_from_path(path: &Path) -> Result<AppConfig, Box<dyn Error>> {
    let s = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&s)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.map_settings().unwrap(), MapSettings::default());
        assert_eq!(cfg.style_settings().unwrap(), StyleSettings::default());
        assert_eq!(cfg.scheduler.governor().max_steps, 1000);
    }

    #[test]
    fn sections_override_independently() {
        let cfg: AppConfig = toml::from_str(
            r#"
            log_filter = "asphalt=debug"
            [map]
            column_units = "words"
            [style]
            parallel_atlas = true
            threads = 4
            [scheduler]
            target_frame_ms = 40.0
            [mesh]
            max_vertices_per_tile = 3000
            "#,
        )
        .unwrap();
        assert_eq!(cfg.log_filter, "asphalt=debug");
        assert_eq!(cfg.map_settings().unwrap().units, ColumnUnits::Words);
        assert_eq!(cfg.map.version, 500);
        assert!(cfg.style_settings().unwrap().parallel_atlas);
        assert_eq!(cfg.style.threads, 4);
        assert_eq!(cfg.scheduler.target_frame(), Duration::from_millis(40));
        assert_eq!(cfg.map_settings().unwrap().max_vertices_per_tile, 3000);
        assert_eq!(cfg.assets, Assets::default());
        assert_eq!(cfg.fetch, Fetch::default());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let cfg: AppConfig = toml::from_str("[map]\nmagic = \"GBM\"").unwrap();
        assert!(cfg.map_settings().is_err());
        assert!(toml::from_str::<AppConfig>("[map]\ncolumn_units = \"nibbles\"").is_err());
    }

    #[test]
    fn missing_file_reports_read_error() {
        let err = load_config_from_path(Path::new("/nonexistent/asphalt.toml")).unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_some());
    }
}
