//! Style loading: fetch, chunk parse, then the texture atlas.

use std::sync::Arc;

use asphalt_format::ChunkTag;
use asphalt_style::{AtlasBuilder, StyleData, StyleDataBuilder, TextureAtlas};
use rayon::ThreadPool;

use crate::container::{ChunkStage, FetchStage};
use crate::error::PipelineError;
use crate::fetch::AssetSource;
use crate::step::{Progress, Stage, Step};

const PARSE_LABEL: &str = "Parsing style";
const ATLAS_LABEL: &str = "Building textures";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleSettings {
    pub magic: ChunkTag,
    pub version: u16,
    /// Build the atlas in a single step on a rayon pool instead of one tile
    /// per step.
    pub parallel_atlas: bool,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            magic: ChunkTag::new(b"GBST"),
            version: 700,
            parallel_atlas: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StyleProduct {
    pub atlas: TextureAtlas,
    pub style: Arc<StyleData>,
}

enum State {
    Fetch(FetchStage),
    Parse(ChunkStage<StyleDataBuilder>),
    Atlas(AtlasBuilder, Arc<StyleData>),
    ParallelAtlas(Arc<StyleData>),
    Finished,
}

pub struct StylePipeline {
    settings: StyleSettings,
    pool: Option<Arc<ThreadPool>>,
    state: State,
}

impl StylePipeline {
    pub fn fetch(
        source: &dyn AssetSource,
        name: &str,
        settings: StyleSettings,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            settings,
            pool: None,
            state: State::Fetch(FetchStage::open(source, name)?),
        })
    }

    pub fn from_bytes(data: Vec<u8>, settings: StyleSettings) -> Result<Self, PipelineError> {
        Ok(Self {
            settings,
            pool: None,
            state: State::Parse(Self::parse_stage(data, &settings)?),
        })
    }

    /// Runs the parallel atlas build on `pool` rather than the global pool.
    pub fn with_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn settings(&self) -> &StyleSettings {
        &self.settings
    }

    fn parse_stage(
        data: Vec<u8>,
        settings: &StyleSettings,
    ) -> Result<ChunkStage<StyleDataBuilder>, PipelineError> {
        ChunkStage::open(
            data,
            settings.magic,
            settings.version,
            StyleDataBuilder::default(),
            PARSE_LABEL,
        )
    }

    fn advance(&self, state: State) -> Result<(State, Step<StyleProduct>), PipelineError> {
        match state {
            State::Fetch(mut fetch) => match fetch.step()? {
                Step::Pending(p) => Ok((State::Fetch(fetch), Step::Pending(p))),
                Step::Done(bytes) => {
                    log::debug!(target: "runtime", "style fetched ({} bytes)", bytes.len());
                    let parse = Self::parse_stage(bytes, &self.settings)?;
                    let progress = Progress::new(0, parse.len() as u64, PARSE_LABEL);
                    Ok((State::Parse(parse), Step::Pending(progress)))
                }
            },
            State::Parse(mut parse) => match parse.step()? {
                Step::Pending(p) => Ok((State::Parse(parse), Step::Pending(p))),
                Step::Done(builder) => {
                    if !builder.has_tiles() {
                        return Err(PipelineError::MissingChunk("TILE"));
                    }
                    let style = Arc::new(builder.finish());
                    if self.settings.parallel_atlas {
                        let progress = Progress::new(0, 1, ATLAS_LABEL);
                        return Ok((State::ParallelAtlas(style), Step::Pending(progress)));
                    }
                    let atlas = AtlasBuilder::new(Arc::clone(&style));
                    let progress = Progress::new(0, atlas.total() as u64, ATLAS_LABEL);
                    Ok((State::Atlas(atlas, style), Step::Pending(progress)))
                }
            },
            State::Atlas(mut atlas, style) => {
                if atlas.step().is_some() {
                    let progress =
                        Progress::new(atlas.done() as u64, atlas.total() as u64, ATLAS_LABEL);
                    return Ok((State::Atlas(atlas, style), Step::Pending(progress)));
                }
                Ok((State::Finished, Step::Done(self.product(atlas.finish(), style))))
            }
            State::ParallelAtlas(style) => {
                let atlas = AtlasBuilder::build_parallel(&style, self.pool.as_deref());
                Ok((State::Finished, Step::Done(self.product(atlas, style))))
            }
            State::Finished => Err(PipelineError::Finished),
        }
    }

    fn product(&self, atlas: TextureAtlas, style: Arc<StyleData>) -> StyleProduct {
        log::info!(
            target: "runtime",
            "style ready: {} tiles in atlas, {} sprite bytes",
            atlas.tile_count(),
            style.sprite_graphics.len()
        );
        StyleProduct { atlas, style }
    }
}

impl Stage for StylePipeline {
    type Output = StyleProduct;

    fn step(&mut self) -> Result<Step<StyleProduct>, PipelineError> {
        let state = std::mem::replace(&mut self.state, State::Finished);
        let (next, step) = self.advance(state)?;
        self.state = next;
        Ok(step)
    }
}
