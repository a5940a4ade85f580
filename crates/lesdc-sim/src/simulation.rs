//! Owned simulation: request sequence + run state + configuration.
//!
//! Drivers hold one `Simulation` for the lifetime of the page/process, call
//! [`Simulation::tick`] once per scheduling slot, and may stop ticking at any
//! point to pause.

use lesdc_core::{RequestSequence, generate};

use crate::config::SimConfig;
use crate::state::{RunPhase, RunState, RunSummary};
use crate::stepper::{RequestOutcome, StepError, StepSnapshot, step_observed};

#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    sequence: RequestSequence,
    state: RunState,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Simulation {
    /// Generate the request sequence and start in [`RunPhase::Idle`].
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            sequence: generate(),
            state: RunState::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub fn sequence(&self) -> &RequestSequence {
        &self.sequence
    }

    #[must_use]
    pub fn state(&self) -> &RunState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.phase() == RunPhase::Complete
    }

    /// Fraction of the sequence processed, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.state.progress(self.sequence.len())
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        self.state.summary()
    }

    /// Process the next batch.
    pub fn tick(&mut self) -> Result<StepSnapshot, StepError> {
        self.tick_observed(|_, _, _| {})
    }

    /// Process the next batch, reporting each request to `observer`.
    pub fn tick_observed<F>(&mut self, observer: F) -> Result<StepSnapshot, StepError>
    where
        F: FnMut(usize, &str, &RequestOutcome),
    {
        step_observed(&self.config, &self.sequence, &mut self.state, observer)
    }

    /// Prepare for ticking. A complete run is reset first ("run again");
    /// an idle or paused run is left as is. Returns true if it reset.
    pub fn start(&mut self) -> bool {
        if self.is_complete() {
            self.reset();
            true
        } else {
            false
        }
    }

    /// Back to [`RunPhase::Idle`]: empty memory, entropy 1.0, zero totals.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Tick until complete, returning every snapshot in order.
    ///
    /// Starts from the current cursor; a complete run yields no snapshots.
    pub fn run_to_completion(&mut self) -> Result<Vec<StepSnapshot>, StepError> {
        let remaining = self.sequence.len().saturating_sub(self.state.cursor());
        let mut snapshots = Vec::with_capacity(remaining.div_ceil(self.config.batch_size.max(1)));
        while !self.is_complete() {
            snapshots.push(self.tick()?);
        }
        Ok(snapshots)
    }
}
