//! Terminal harness for the LES data center simulation.
//!
//! This crate provides:
//! - Driver: ticks a simulation on a fixed cadence, with pause and "run again"
//! - Trailing log: the newest sampled lines of the live feed
//! - Structured logs: JSONL run events plus a schema validator
//! - Reports: final energy comparison as plain text or JSON
//! - Fixtures: deterministic run captures, sha256 digests and drift diffs

#![forbid(unsafe_code)]

pub mod driver;
pub mod error;
pub mod fixture;
pub mod report;
pub mod structured_log;
pub mod trail;

pub use driver::{Driver, DriverOptions, DriverOutcome};
pub use error::HarnessError;
pub use fixture::{RunFixtureV1, build_run_fixture, diff_fixtures, fixture_digest};
pub use report::{OutputFormat, RunReport};
pub use structured_log::{LogEmitter, LogEntry, LogLevel};
pub use trail::{TrailKind, TrailingLog};
