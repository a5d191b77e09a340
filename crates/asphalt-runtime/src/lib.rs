//! Cooperative loading pipelines: fetch -> chunk parse -> resolve -> build,
//! stepped a bounded amount per frame.
#![forbid(unsafe_code)]

mod container;
pub mod error;
pub mod fetch;
pub mod governor;
pub mod map_pipeline;
pub mod scheduler;
pub mod sink;
pub mod step;
pub mod style_pipeline;

pub use error::PipelineError;
pub use fetch::{AssetSource, AssetStream, FetchPoll, FileAssetSource, MemoryAssetSource};
pub use governor::{FrameGovernor, GovernorConfig};
pub use map_pipeline::{MapPipeline, MapProduct, MapSettings};
pub use scheduler::{IncrementalScheduler, LoaderEvent, Product};
pub use sink::RenderSink;
pub use step::{Progress, Stage, Step, run_to_completion};
pub use style_pipeline::{StylePipeline, StyleProduct, StyleSettings};
