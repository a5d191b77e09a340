use crate::error::PipelineError;

/// Progress of the unit of work a stage just finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub progress: u64,
    pub max: u64,
    pub label: String,
}

impl Progress {
    pub fn new(progress: u64, max: u64, label: impl Into<String>) -> Self {
        Self {
            progress,
            max,
            label: label.into(),
        }
    }

    /// Completion in percent; 0 while `max` is unknown.
    pub fn percent(&self) -> f32 {
        if self.max == 0 {
            return 0.0;
        }
        (self.progress.min(self.max) as f64 / self.max as f64 * 100.0) as f32
    }
}

#[derive(Debug)]
pub enum Step<T> {
    Pending(Progress),
    Done(T),
}

impl<T> Step<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done(_))
    }
}

/// A resumable unit of cooperative work. Each `step` does one bounded piece
/// and returns; after `Done` further steps fail with `Finished`.
pub trait Stage {
    type Output;

    fn step(&mut self) -> Result<Step<Self::Output>, PipelineError>;
}

impl<S: Stage + ?Sized> Stage for Box<S> {
    type Output = S::Output;

    fn step(&mut self) -> Result<Step<Self::Output>, PipelineError> {
        (**self).step()
    }
}

/// Steps `stage` until it finishes.
pub fn run_to_completion<S: Stage>(stage: &mut S) -> Result<S::Output, PipelineError> {
    loop {
        if let Step::Done(out) = stage.step()? {
            return Ok(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_handles_unknown_and_overshoot() {
        assert_eq!(Progress::new(5, 0, "x").percent(), 0.0);
        assert_eq!(Progress::new(64, 256, "x").percent(), 25.0);
        assert_eq!(Progress::new(300, 256, "x").percent(), 100.0);
    }
}
