//! Adaptive per-frame step budget.
//!
//! The governor times the gap between successive drive calls and, every few
//! calls, rescales the number of stage steps per call so that a frame lands
//! near the target period: `steps = ceil(steps * target / average_gap)`,
//! clamped to `1..=max_steps`. It only changes how finely work is sliced.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GovernorConfig {
    pub target_frame: Duration,
    pub initial_steps: u32,
    pub max_steps: u32,
    /// Drive calls between recalibrations.
    pub recalibrate_every: u32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            target_frame: Duration::from_secs_f64(1.0 / 60.0),
            initial_steps: 1,
            max_steps: 1000,
            recalibrate_every: 8,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FrameGovernor {
    cfg: GovernorConfig,
    steps: u32,
    calls: u32,
    last: Option<Instant>,
    gaps: Vec<Duration>,
}

impl FrameGovernor {
    pub fn new(cfg: GovernorConfig) -> Self {
        let max_steps = cfg.max_steps.max(1);
        Self {
            cfg: GovernorConfig { max_steps, ..cfg },
            steps: cfg.initial_steps.clamp(1, max_steps),
            calls: 0,
            last: None,
            gaps: Vec::with_capacity(cfg.recalibrate_every as usize),
        }
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.cfg
    }

    /// Current budget without registering a call.
    pub fn steps_per_frame(&self) -> u32 {
        self.steps
    }

    /// Registers a drive call now and returns the step budget for it.
    pub fn begin_frame(&mut self) -> u32 {
        self.begin_frame_at(Instant::now())
    }

    pub fn begin_frame_at(&mut self, now: Instant) -> u32 {
        if let Some(last) = self.last {
            self.gaps.push(now.saturating_duration_since(last));
        }
        self.last = Some(now);
        self.calls += 1;
        if self.calls >= self.cfg.recalibrate_every.max(1) && !self.gaps.is_empty() {
            self.recalibrate();
        }
        self.steps
    }

    /// Forgets timing history and returns to the initial budget.
    pub fn reset(&mut self) {
        self.steps = self.cfg.initial_steps.clamp(1, self.cfg.max_steps);
        self.calls = 0;
        self.last = None;
        self.gaps.clear();
    }

    fn recalibrate(&mut self) {
        let total: Duration = self.gaps.iter().sum();
        let average = total / self.gaps.len() as u32;
        let max = u128::from(self.cfg.max_steps);
        let scaled = match average.as_nanos() {
            0 => max,
            avg => (u128::from(self.steps) * self.cfg.target_frame.as_nanos()).div_ceil(avg),
        };
        let steps = scaled.clamp(1, max) as u32;
        log::trace!(
            target: "runtime",
            "recalibrated: avg frame {:.2}ms, {} -> {} steps",
            average.as_secs_f64() * 1000.0,
            self.steps,
            steps
        );
        self.steps = steps;
        self.calls = 0;
        self.gaps.clear();
    }
}

impl Default for FrameGovernor {
    fn default() -> Self {
        Self::new(GovernorConfig::default())
    }
}
