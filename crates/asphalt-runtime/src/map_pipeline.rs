//! Map loading: fetch, chunk parse, column resolve, then one mesh tile per step.

use std::sync::Arc;

use asphalt_format::ChunkTag;
use asphalt_map::{ColumnResolver, ColumnUnits, DecodeWarning, Light, MAP_SIZE, MapDataBuilder};
use asphalt_mesh::{DEFAULT_MAX_VERTICES_PER_TILE, MeshTile, TiledMeshAssembler};

use crate::container::{ChunkStage, FetchStage};
use crate::error::PipelineError;
use crate::fetch::AssetSource;
use crate::step::{Progress, Stage, Step};

const PARSE_LABEL: &str = "Parsing map";
const RESOLVE_LABEL: &str = "Decompressing map";
const BUILD_LABEL: &str = "Creating map model";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapSettings {
    pub magic: ChunkTag,
    pub version: u16,
    pub units: ColumnUnits,
    pub max_vertices_per_tile: usize,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            magic: ChunkTag::new(b"GBMP"),
            version: 500,
            units: ColumnUnits::Bytes,
            max_vertices_per_tile: DEFAULT_MAX_VERTICES_PER_TILE,
        }
    }
}

/// Everything a renderer needs from a loaded map.
#[derive(Clone, Debug, Default)]
pub struct MapProduct {
    pub tiles: Vec<MeshTile>,
    pub lights: Vec<Light>,
    pub warnings: Vec<DecodeWarning>,
}

impl MapProduct {
    pub fn vertex_count(&self) -> usize {
        self.tiles.iter().map(MeshTile::vertex_count).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.tiles.iter().map(MeshTile::triangle_count).sum()
    }
}

enum State {
    Fetch(FetchStage),
    Parse(ChunkStage<MapDataBuilder>),
    Resolve(ColumnResolver),
    Build {
        assembler: TiledMeshAssembler,
        lights: Vec<Light>,
        warnings: Vec<DecodeWarning>,
    },
    Finished,
}

/// Resumable map load. Fatal errors end the pipeline; later steps report
/// `Finished`.
pub struct MapPipeline {
    settings: MapSettings,
    state: State,
}

impl MapPipeline {
    /// Starts by fetching `name` from `source`.
    pub fn fetch(
        source: &dyn AssetSource,
        name: &str,
        settings: MapSettings,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            settings,
            state: State::Fetch(FetchStage::open(source, name)?),
        })
    }

    /// Starts from bytes already in memory; the header is checked here.
    pub fn from_bytes(data: Vec<u8>, settings: MapSettings) -> Result<Self, PipelineError> {
        Ok(Self {
            settings,
            state: State::Parse(Self::parse_stage(data, &settings)?),
        })
    }

    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished)
    }

    fn parse_stage(
        data: Vec<u8>,
        settings: &MapSettings,
    ) -> Result<ChunkStage<MapDataBuilder>, PipelineError> {
        ChunkStage::open(
            data,
            settings.magic,
            settings.version,
            MapDataBuilder::new(settings.units),
            PARSE_LABEL,
        )
    }

    fn advance(&self, state: State) -> Result<(State, Step<MapProduct>), PipelineError> {
        match state {
            State::Fetch(mut fetch) => match fetch.step()? {
                Step::Pending(p) => Ok((State::Fetch(fetch), Step::Pending(p))),
                Step::Done(bytes) => {
                    log::debug!(target: "runtime", "map fetched ({} bytes)", bytes.len());
                    let parse = Self::parse_stage(bytes, &self.settings)?;
                    let progress = Progress::new(0, parse.len() as u64, PARSE_LABEL);
                    Ok((State::Parse(parse), Step::Pending(progress)))
                }
            },
            State::Parse(mut parse) => match parse.step()? {
                Step::Pending(p) => Ok((State::Parse(parse), Step::Pending(p))),
                Step::Done(builder) => {
                    let map = builder.finish().ok_or(PipelineError::MissingChunk("DMAP"))?;
                    let progress = Progress::new(0, MAP_SIZE as u64, RESOLVE_LABEL);
                    Ok((
                        State::Resolve(ColumnResolver::new(Arc::new(map))),
                        Step::Pending(progress),
                    ))
                }
            },
            State::Resolve(mut resolver) => {
                if resolver.step_row().is_some() {
                    let progress =
                        Progress::new(resolver.rows_done() as u64, MAP_SIZE as u64, RESOLVE_LABEL);
                    return Ok((State::Resolve(resolver), Step::Pending(progress)));
                }
                let mut resolved = resolver.finish();
                let warnings = std::mem::take(&mut resolved.warnings);
                let lights = resolved.map().lights.clone();
                let assembler = TiledMeshAssembler::with_max_vertices(
                    resolved,
                    self.settings.max_vertices_per_tile,
                );
                let progress = Progress::new(0, assembler.total() as u64, BUILD_LABEL);
                Ok((
                    State::Build {
                        assembler,
                        lights,
                        warnings,
                    },
                    Step::Pending(progress),
                ))
            }
            State::Build {
                mut assembler,
                lights,
                warnings,
            } => {
                if assembler.step().is_some() {
                    let progress = Progress::new(
                        assembler.done() as u64,
                        assembler.total() as u64,
                        BUILD_LABEL,
                    );
                    return Ok((
                        State::Build {
                            assembler,
                            lights,
                            warnings,
                        },
                        Step::Pending(progress),
                    ));
                }
                let product = MapProduct {
                    tiles: assembler.finish(),
                    lights,
                    warnings,
                };
                log::info!(
                    target: "runtime",
                    "map ready: {} tiles, {} triangles, {} lights, {} warnings",
                    product.tiles.len(),
                    product.triangle_count(),
                    product.lights.len(),
                    product.warnings.len()
                );
                Ok((State::Finished, Step::Done(product)))
            }
            State::Finished => Err(PipelineError::Finished),
        }
    }
}

impl Stage for MapPipeline {
    type Output = MapProduct;

    fn step(&mut self) -> Result<Step<MapProduct>, PipelineError> {
        let state = std::mem::replace(&mut self.state, State::Finished);
        let (next, step) = self.advance(state)?;
        self.state = next;
        Ok(step)
    }
}
