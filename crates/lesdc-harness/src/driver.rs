//! Tick driver: schedules `Simulation::tick` calls on a fixed cadence.
//!
//! The driver owns the simulation, the trailing log and the optional JSONL
//! emitter. Ticking stops when the run completes or `max_ticks` is reached
//! (pause); a paused driver resumes from its cursor on the next `run`.

use std::time::{Duration, Instant};

use serde_json::json;

use lesdc_sim::{RequestOutcome, RunSummary, SimConfig, Simulation, StepSnapshot};

use crate::error::HarnessError;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};
use crate::trail::{TrailKind, TrailingLog};

#[derive(Debug, Clone, Copy, Default)]
pub struct DriverOptions {
    /// Delay between ticks. Zero runs back to back.
    pub tick: Duration,
    /// Stop after this many ticks in one `run` call.
    pub max_ticks: Option<usize>,
    /// Emit one debug event per request.
    pub trace_requests: bool,
}

#[derive(Debug, Clone)]
pub struct DriverOutcome {
    /// Ticks performed by this `run` call.
    pub ticks: usize,
    pub paused: bool,
    pub summary: RunSummary,
    pub elapsed_ms: u64,
}

pub struct Driver {
    sim: Simulation,
    trail: TrailingLog,
    emitter: Option<LogEmitter>,
    options: DriverOptions,
    total_ticks: usize,
}

impl Driver {
    #[must_use]
    pub fn new(config: SimConfig, options: DriverOptions) -> Self {
        Self {
            trail: TrailingLog::new(config.trail_capacity),
            sim: Simulation::new(config),
            emitter: None,
            options,
            total_ticks: 0,
        }
    }

    #[must_use]
    pub fn with_emitter(mut self, emitter: LogEmitter) -> Self {
        self.emitter = Some(emitter);
        self
    }

    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    #[must_use]
    pub fn trail(&self) -> &TrailingLog {
        &self.trail
    }

    /// Ticks since the last reset, across `run` calls.
    #[must_use]
    pub fn total_ticks(&self) -> usize {
        self.total_ticks
    }

    /// Reset the run and clear the trail.
    pub fn reset(&mut self) -> Result<(), HarnessError> {
        self.sim.reset();
        self.after_reset()
    }

    fn after_reset(&mut self) -> Result<(), HarnessError> {
        self.total_ticks = 0;
        self.trail.clear();
        self.trail.push(TrailKind::Status, "Simulation reset", None);
        self.emit(LogEntry::new("", LogLevel::Info, "run_reset").with_phase(self.sim.phase()))
    }

    /// Tick until complete or until `max_ticks`, calling `on_tick` after each one.
    ///
    /// A complete run is reset first.
    pub fn run<F>(&mut self, mut on_tick: F) -> Result<DriverOutcome, HarnessError>
    where
        F: FnMut(&StepSnapshot, &TrailingLog),
    {
        if self.sim.start() {
            self.after_reset()?;
        }
        let started = Instant::now();
        let mode = self.sim.config().compression_source.as_str();
        self.emit(
            LogEntry::new("", LogLevel::Info, "run_start")
                .with_mode(mode)
                .with_phase(self.sim.phase())
                .with_details(json!({
                    "batch_size": self.sim.config().batch_size,
                    "cursor": self.sim.state().cursor(),
                    "total": self.sim.sequence().len(),
                    "tick_ms": self.options.tick.as_millis() as u64,
                })),
        )?;

        let mut ticks = 0usize;
        while !self.sim.is_complete() {
            if self.options.max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
            if ticks > 0 && !self.options.tick.is_zero() {
                std::thread::sleep(self.options.tick);
            }

            let mut traced: Vec<(usize, Outcome, f64)> = Vec::new();
            let trace = self.options.trace_requests && self.emitter.is_some();
            let snap = self.sim.tick_observed(|index, _, outcome: &RequestOutcome| {
                if trace {
                    let kind = if outcome.is_redundant() {
                        Outcome::Redundant
                    } else {
                        Outcome::Fresh
                    };
                    traced.push((index, kind, outcome.cost()));
                }
            })?;
            ticks += 1;
            self.total_ticks += 1;

            for (index, outcome, cost) in traced {
                self.emit(
                    LogEntry::new("", LogLevel::Debug, "request")
                        .with_request(index, outcome)
                        .with_details(json!({ "cost": cost })),
                )?;
            }
            self.trail.push_snapshot(&snap);
            self.emit(
                LogEntry::new("", LogLevel::Info, "step")
                    .with_snapshot(&snap)
                    .with_details(json!({
                        "tick": self.total_ticks,
                        "fresh": snap.fresh_in_batch,
                        "redundant": snap.redundant_in_batch,
                    })),
            )?;
            on_tick(&snap, &self.trail);
        }

        let paused = !self.sim.is_complete();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let summary = self.sim.summary();
        let (event, status) = if paused {
            ("run_paused", "Simulation paused")
        } else {
            ("run_complete", "Simulation complete")
        };
        self.trail.push(
            TrailKind::Status,
            status,
            Some(format!("{:.1}% saved", summary.savings_percent)),
        );
        self.emit(
            LogEntry::new("", LogLevel::Info, event)
                .with_mode(mode)
                .with_phase(summary.phase)
                .with_duration_ms(elapsed_ms)
                .with_details(json!({
                    "cursor": summary.cursor,
                    "basic_total": summary.basic_total,
                    "optimized_total": summary.optimized_total,
                    "savings_percent": summary.savings_percent,
                    "entropy": summary.entropy,
                    "memory_size": summary.memory_size,
                })),
        )?;
        if let Some(emitter) = self.emitter.as_mut() {
            emitter.flush()?;
        }

        Ok(DriverOutcome {
            ticks,
            paused,
            summary,
            elapsed_ms,
        })
    }

    fn emit(&mut self, entry: LogEntry) -> Result<(), HarnessError> {
        if let Some(emitter) = self.emitter.as_mut() {
            emitter.emit_entry(entry)?;
        }
        Ok(())
    }
}
