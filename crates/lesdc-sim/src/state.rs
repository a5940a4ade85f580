//! Run state owned by a single simulation run.

use serde::{Deserialize, Serialize};

use lesdc_core::SignatureMemory;

/// Initial (and post-reset) value of the run entropy.
pub const INITIAL_ENTROPY: f64 = 1.0;

/// Lifecycle of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    /// Cursor at 0, nothing processed.
    #[default]
    Idle,
    /// Some, but not all, requests processed.
    Running,
    /// Cursor at the sequence length. Terminal until reset.
    Complete,
}

impl RunPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Complete => "complete",
        }
    }
}

/// Mutable state of one run: totals, cursor, run entropy and memory.
///
/// Only the stepper mutates it; [`RunState::reset`] is the only way back to
/// [`RunPhase::Idle`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub(crate) basic_total: f64,
    pub(crate) optimized_total: f64,
    pub(crate) entropy: f64,
    pub(crate) cursor: usize,
    pub(crate) phase: RunPhase,
    pub(crate) memory: SignatureMemory,
    pub(crate) redundant_hits: u64,
    pub(crate) fresh_requests: u64,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            basic_total: 0.0,
            optimized_total: 0.0,
            entropy: INITIAL_ENTROPY,
            cursor: 0,
            phase: RunPhase::Idle,
            memory: SignatureMemory::new(),
            redundant_hits: 0,
            fresh_requests: 0,
        }
    }

    /// Clear memory, totals and cursor; entropy back to 1.0.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[must_use]
    pub fn basic_total(&self) -> f64 {
        self.basic_total
    }

    #[must_use]
    pub fn optimized_total(&self) -> f64 {
        self.optimized_total
    }

    /// Current run entropy, in `(0, 1]`.
    #[must_use]
    pub fn entropy(&self) -> f64 {
        self.entropy
    }

    /// Requests processed so far.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    #[must_use]
    pub fn memory(&self) -> &SignatureMemory {
        &self.memory
    }

    #[must_use]
    pub fn redundant_hits(&self) -> u64 {
        self.redundant_hits
    }

    #[must_use]
    pub fn fresh_requests(&self) -> u64 {
        self.fresh_requests
    }

    /// `cursor / total`, 0 for an empty total.
    #[must_use]
    pub fn progress(&self, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            self.cursor as f64 / total as f64
        }
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            basic_total: self.basic_total,
            optimized_total: self.optimized_total,
            savings_percent: savings_percent(self.basic_total, self.optimized_total),
            entropy: self.entropy,
            memory_size: self.memory.len(),
            cursor: self.cursor,
            phase: self.phase,
            fresh_requests: self.fresh_requests,
            redundant_hits: self.redundant_hits,
        }
    }
}

/// Fresh run state. Equivalent to `RunState::new()`.
#[must_use]
pub fn reset() -> RunState {
    RunState::new()
}

/// `100 * (1 - optimized / basic)`, or 0 when nothing was charged yet.
#[must_use]
pub fn savings_percent(basic_total: f64, optimized_total: f64) -> f64 {
    if basic_total > 0.0 {
        100.0 * (1.0 - optimized_total / basic_total)
    } else {
        0.0
    }
}

/// Aggregate view of a run for reports and fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub basic_total: f64,
    pub optimized_total: f64,
    pub savings_percent: f64,
    pub entropy: f64,
    pub memory_size: usize,
    pub cursor: usize,
    pub phase: RunPhase,
    pub fresh_requests: u64,
    pub redundant_hits: u64,
}
