//! FIFO job queue stepped under a frame budget.
//!
//! Only the job at the head of the queue runs. Each drive call spends the
//! budget on it, moving to the next job when it finishes or fails, and
//! reports what happened as [`LoaderEvent`]s in order. Progress is coalesced
//! to the latest value per job per call.

use std::collections::VecDeque;
use std::time::Instant;

use crate::error::PipelineError;
use crate::governor::FrameGovernor;
use crate::map_pipeline::MapProduct;
use crate::sink::RenderSink;
use crate::step::{Progress, Stage, Step};
use crate::style_pipeline::StyleProduct;

#[derive(Clone, Debug)]
pub enum Product {
    Map(MapProduct),
    Style(StyleProduct),
}

impl Product {
    /// Hands the product to `sink` under `name`.
    pub fn deliver(&self, name: &str, sink: &mut dyn RenderSink) {
        match self {
            Product::Map(map) => {
                sink.mesh_tiles(name, &map.tiles);
                sink.lights(name, &map.lights);
            }
            Product::Style(style) => sink.atlas(name, &style.atlas),
        }
    }
}

impl From<MapProduct> for Product {
    fn from(p: MapProduct) -> Self {
        Product::Map(p)
    }
}

impl From<StyleProduct> for Product {
    fn from(p: StyleProduct) -> Self {
        Product::Style(p)
    }
}

#[derive(Debug)]
pub enum LoaderEvent {
    Progress {
        name: String,
        percent: f32,
        label: String,
    },
    Loaded {
        name: String,
        product: Product,
    },
    Failed {
        name: String,
        error: PipelineError,
    },
    /// The queue drained. Sent once per batch of jobs.
    AllLoaded,
}

struct IntoProduct<S>(S);

impl<S> Stage for IntoProduct<S>
where
    S: Stage,
    S::Output: Into<Product>,
{
    type Output = Product;

    fn step(&mut self) -> Result<Step<Product>, PipelineError> {
        Ok(match self.0.step()? {
            Step::Pending(p) => Step::Pending(p),
            Step::Done(out) => Step::Done(out.into()),
        })
    }
}

struct Job {
    name: String,
    stage: Box<dyn Stage<Output = Product>>,
}

pub struct IncrementalScheduler {
    jobs: VecDeque<Job>,
    governor: FrameGovernor,
    drained: bool,
}

impl IncrementalScheduler {
    pub fn new(governor: FrameGovernor) -> Self {
        Self {
            jobs: VecDeque::new(),
            governor,
            drained: true,
        }
    }

    /// Queues `stage` behind any existing jobs.
    pub fn add<S>(&mut self, name: impl Into<String>, stage: S) -> &mut Self
    where
        S: Stage + 'static,
        S::Output: Into<Product>,
    {
        let name = name.into();
        log::debug!(target: "runtime", "queued {}", name);
        self.jobs.push_back(Job {
            name,
            stage: Box::new(IntoProduct(stage)),
        });
        self.drained = false;
        self
    }

    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn current(&self) -> Option<&str> {
        self.jobs.front().map(|j| j.name.as_str())
    }

    pub fn is_idle(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn governor(&self) -> &FrameGovernor {
        &self.governor
    }

    /// One frame's worth of work at the governor's current budget.
    pub fn drive(&mut self) -> Vec<LoaderEvent> {
        let budget = self.governor.begin_frame();
        self.drive_steps(budget)
    }

    pub fn drive_at(&mut self, now: Instant) -> Vec<LoaderEvent> {
        let budget = self.governor.begin_frame_at(now);
        self.drive_steps(budget)
    }

    /// Runs at most `steps` stage steps.
    pub fn drive_steps(&mut self, steps: u32) -> Vec<LoaderEvent> {
        let mut events = Vec::new();
        let mut latest: Option<(String, Progress)> = None;
        for _ in 0..steps {
            let Some(job) = self.jobs.front_mut() else {
                break;
            };
            let result = job.stage.step();
            match result {
                Ok(Step::Pending(p)) => latest = Some((job.name.clone(), p)),
                Ok(Step::Done(product)) => {
                    flush(&mut latest, &mut events);
                    let name = job.name.clone();
                    self.jobs.pop_front();
                    log::info!(target: "runtime", "loaded {}", name);
                    events.push(LoaderEvent::Loaded { name, product });
                }
                Err(error) => {
                    flush(&mut latest, &mut events);
                    let name = job.name.clone();
                    self.jobs.pop_front();
                    log::error!(target: "runtime", "{} failed: {}", name, error);
                    events.push(LoaderEvent::Failed { name, error });
                }
            }
        }
        flush(&mut latest, &mut events);
        if self.jobs.is_empty() && !self.drained {
            self.drained = true;
            events.push(LoaderEvent::AllLoaded);
        }
        events
    }
}

impl Default for IncrementalScheduler {
    fn default() -> Self {
        Self::new(FrameGovernor::default())
    }
}

fn flush(latest: &mut Option<(String, Progress)>, events: &mut Vec<LoaderEvent>) {
    if let Some((name, p)) = latest.take() {
        log::trace!(target: "runtime", "{}: {} {:.0}%", name, p.label, p.percent());
        events.push(LoaderEvent::Progress {
            name,
            percent: p.percent(),
            label: p.label,
        });
    }
}
