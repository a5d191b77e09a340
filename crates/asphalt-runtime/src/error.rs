use std::fmt;
use std::io;

use asphalt_format::FormatError;

/// Terminal failure of a pipeline. Recoverable problems are reported as
/// warnings on the product instead.
#[derive(Debug)]
pub enum PipelineError {
    Format(FormatError),
    Fetch(io::Error),
    /// A required chunk never appeared, e.g. a map without `DMAP`.
    MissingChunk(&'static str),
    /// The stage was stepped after yielding its product.
    Finished,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Format(e) => write!(f, "decode failed: {}", e),
            PipelineError::Fetch(e) => write!(f, "fetch failed: {}", e),
            PipelineError::MissingChunk(tag) => write!(f, "container has no {} chunk", tag),
            PipelineError::Finished => write!(f, "stage already finished"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Format(e) => Some(e),
            PipelineError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FormatError> for PipelineError {
    fn from(e: FormatError) -> Self {
        PipelineError::Format(e)
    }
}

impl From<io::Error> for PipelineError {
    fn from(e: io::Error) -> Self {
        PipelineError::Fetch(e)
    }
}
