//! LES/CEML batch simulation.
//!
//! Compares two synthetic energy policies over the request corpus from
//! `lesdc-core`:
//! - **Basic**: fixed cost per request.
//! - **Optimized**: CEML redundancy discount plus LES entropy-scaled cost.
//!
//! # Architecture
//!
//! - **Configuration** (`config`): cost constants and environment overrides
//! - **Run state** (`state`): totals, cursor, run entropy, signature memory
//! - **Stepper** (`stepper`): one bounded batch per call
//! - **Simulation** (`simulation`): owned sequence + state for drivers

#![deny(unsafe_code)]

pub mod config;
pub mod simulation;
pub mod state;
pub mod stepper;

pub use config::{CompressionSource, ConfigError, SimConfig};
pub use simulation::Simulation;
pub use state::{RunPhase, RunState, RunSummary, reset, savings_percent};
pub use stepper::{RequestOutcome, StepError, StepSnapshot, process_request, step, step_with};
