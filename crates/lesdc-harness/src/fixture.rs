//! Deterministic run fixtures and drift diffs.
//!
//! A fixture captures one full run under a given configuration:
//! - no timestamps
//! - stable ordering (sampled step lines, sorted signature memory)
//! - batch size, mode and stride included for reproducibility
//!
//! Fixtures are diffed field by field and gated by their sha256 digest.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use lesdc_sim::{RunPhase, SimConfig, Simulation, StepError, StepSnapshot};

use crate::error::HarnessError;

pub const FIXTURE_VERSION: &str = "v1";
const SCENARIO_ID: &str = "lesdc_full_run";

/// Run fixture schema (v1).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunFixtureV1 {
    pub version: String,
    pub scenario: RunScenarioV1,
    /// One line per sampled step.
    pub step_lines: Vec<String>,
    /// `key: value` lines for the final state.
    pub summary_lines: Vec<String>,
    /// Signature memory in sorted order.
    pub memory: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunScenarioV1 {
    pub id: String,
    pub batch_size: usize,
    pub mode: String,
    pub sequence_len: usize,
    pub calls: usize,
    pub stride: usize,
}

/// Run `config` to completion, sampling every `stride`-th step (and the last).
///
/// A zero stride is treated as 1.
pub fn build_run_fixture(config: &SimConfig, stride: usize) -> Result<RunFixtureV1, StepError> {
    let stride = stride.max(1);
    let mut sim = Simulation::new(*config);
    let mut step_lines = Vec::new();
    let mut calls = 0usize;
    while !sim.is_complete() {
        let snap = sim.tick()?;
        calls += 1;
        if calls % stride == 0 || snap.phase == RunPhase::Complete {
            step_lines.push(step_line(calls, &snap));
        }
    }

    let summary = sim.summary();
    let summary_lines = vec![
        format!("basic_total: {:.9}", summary.basic_total),
        format!("optimized_total: {:.9}", summary.optimized_total),
        format!("savings_percent: {:.9}", summary.savings_percent),
        format!("entropy: {:.12}", summary.entropy),
        format!("memory_size: {}", summary.memory_size),
        format!("cursor: {}", summary.cursor),
        format!("fresh_requests: {}", summary.fresh_requests),
        format!("redundant_hits: {}", summary.redundant_hits),
    ];

    Ok(RunFixtureV1 {
        version: String::from(FIXTURE_VERSION),
        scenario: RunScenarioV1 {
            id: String::from(SCENARIO_ID),
            batch_size: config.batch_size,
            mode: config.compression_source.as_str().to_string(),
            sequence_len: sim.sequence().len(),
            calls,
            stride,
        },
        step_lines,
        summary_lines,
        memory: sim.state().memory().iter().map(str::to_string).collect(),
    })
}

fn step_line(call: usize, snap: &StepSnapshot) -> String {
    format!(
        "step={call:04} cursor={:04} basic={:.6} optimized={:.6} entropy={:.9} memory={} fresh={} redundant={}",
        snap.cursor,
        snap.basic_total,
        snap.optimized_total,
        snap.entropy,
        snap.memory_size,
        snap.fresh_in_batch,
        snap.redundant_in_batch,
    )
}

fn hex_lower(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(&mut out, "{b:02x}").ok();
    }
    out
}

/// sha256 of the compact JSON encoding.
pub fn fixture_digest(fixture: &RunFixtureV1) -> Result<String, serde_json::Error> {
    use sha2::Digest;
    let canonical = serde_json::to_vec(fixture)?;
    Ok(hex_lower(&sha2::Sha256::digest(&canonical)))
}

/// Write pretty JSON, creating parent directories. Returns the digest.
pub fn write_fixture(path: &Path, fixture: &RunFixtureV1) -> Result<String, HarnessError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut body = serde_json::to_string_pretty(fixture)?;
    body.push('\n');
    std::fs::write(path, body)?;
    Ok(fixture_digest(fixture)?)
}

pub fn load_fixture(path: &Path) -> Result<RunFixtureV1, HarnessError> {
    let body = std::fs::read_to_string(path)?;
    let fixture: RunFixtureV1 = serde_json::from_str(&body)?;
    if fixture.version != FIXTURE_VERSION {
        return Err(HarnessError::FixtureVersion {
            found: fixture.version,
            expected: String::from(FIXTURE_VERSION),
        });
    }
    Ok(fixture)
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffStatus {
    Same,
    Changed,
    Alert,
}

impl DiffStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Same => "OK",
            Self::Changed => "CHG",
            Self::Alert => "ALERT",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiffRow {
    pub field: String,
    pub golden: String,
    pub current: String,
    pub delta: Option<f64>,
    pub status: DiffStatus,
}

#[derive(Debug, Clone)]
pub struct FixtureDiffReport {
    pub scenario_id: String,
    pub rows: Vec<DiffRow>,
}

impl FixtureDiffReport {
    #[must_use]
    pub fn has_drift(&self) -> bool {
        self.rows.iter().any(|r| r.status != DiffStatus::Same)
    }

    #[must_use]
    pub fn alerts(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.status == DiffStatus::Alert)
            .count()
    }
}

/// Compare two fixtures: scenario, final summary, memory, then sampled steps.
#[must_use]
pub fn diff_fixtures(golden: &RunFixtureV1, current: &RunFixtureV1) -> FixtureDiffReport {
    let mut rows = Vec::new();

    let (g, c) = (&golden.scenario, &current.scenario);
    rows.push(row(
        "scenario.batch_size",
        g.batch_size.to_string(),
        c.batch_size.to_string(),
    ));
    rows.push(row("scenario.mode", g.mode.clone(), c.mode.clone()));
    rows.push(row(
        "scenario.sequence_len",
        g.sequence_len.to_string(),
        c.sequence_len.to_string(),
    ));
    rows.push(row(
        "scenario.calls",
        g.calls.to_string(),
        c.calls.to_string(),
    ));

    let golden_map = parse_summary_lines(&golden.summary_lines);
    let current_map = parse_summary_lines(&current.summary_lines);
    let mut keys: Vec<&String> = golden_map.keys().chain(current_map.keys()).collect();
    keys.sort();
    keys.dedup();
    for key in keys {
        let g = golden_map
            .get(key)
            .cloned()
            .unwrap_or_else(|| String::from("<missing>"));
        let c = current_map
            .get(key)
            .cloned()
            .unwrap_or_else(|| String::from("<missing>"));
        rows.push(row(key, g, c));
    }

    rows.push(row("memory", golden.memory.join(","), current.memory.join(",")));

    let drifted_steps = golden
        .step_lines
        .iter()
        .zip(&current.step_lines)
        .filter(|(g, c)| g != c)
        .count()
        + golden.step_lines.len().abs_diff(current.step_lines.len());
    let status = if drifted_steps == 0 {
        DiffStatus::Same
    } else {
        DiffStatus::Changed
    };
    rows.push(DiffRow {
        field: String::from("step_lines"),
        golden: format!("{} lines", golden.step_lines.len()),
        current: format!("{} lines, {drifted_steps} drifted", current.step_lines.len()),
        delta: None,
        status,
    });

    FixtureDiffReport {
        scenario_id: golden.scenario.id.clone(),
        rows,
    }
}

fn row(field: &str, golden: String, current: String) -> DiffRow {
    let (delta, status) = classify_delta(field, &golden, &current);
    DiffRow {
        field: field.to_string(),
        golden,
        current,
        delta,
        status,
    }
}

fn parse_summary_lines(lines: &[String]) -> BTreeMap<String, String> {
    lines
        .iter()
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn classify_delta(field: &str, golden: &str, current: &str) -> (Option<f64>, DiffStatus) {
    if golden == current {
        return (None, DiffStatus::Same);
    }
    let delta = golden
        .parse::<f64>()
        .ok()
        .zip(current.parse::<f64>().ok())
        .map(|(g, c)| c - g);
    let Some(delta) = delta else {
        return (None, DiffStatus::Changed);
    };
    if threshold_for(field).is_some_and(|t| delta.abs() >= t) {
        return (Some(delta), DiffStatus::Alert);
    }
    (Some(delta), DiffStatus::Changed)
}

fn threshold_for(field: &str) -> Option<f64> {
    match field {
        "basic_total" | "optimized_total" => Some(1.0),
        "savings_percent" => Some(0.5),
        "entropy" => Some(0.01),
        "memory_size" | "fresh_requests" | "redundant_hits" => Some(1.0),
        _ => None,
    }
}

#[must_use]
pub fn render_plain(report: &FixtureDiffReport) -> String {
    let mut out = String::new();

    let w_field: usize = 22;
    let w_val: usize = 26;
    let w_delta: usize = 14;
    let w_status: usize = 6;

    writeln!(out, "run fixture diff (scenario={})", report.scenario_id).ok();
    writeln!(
        out,
        "{:<w_field$} {:<w_val$} {:<w_val$} {:<w_delta$} {:<w_status$}",
        "field", "golden", "current", "delta", "status",
    )
    .ok();
    writeln!(
        out,
        "{}",
        "-".repeat(w_field + w_val + w_val + w_delta + w_status + 4)
    )
    .ok();

    for row in &report.rows {
        let delta = row.delta.map(|d| format!("{d:+.6}")).unwrap_or_default();
        writeln!(
            out,
            "{:<w_field$} {:<w_val$} {:<w_val$} {:<w_delta$} {:<w_status$}",
            truncate(&row.field, w_field),
            truncate(&row.golden, w_val),
            truncate(&row.current, w_val),
            truncate(&delta, w_delta),
            row.status.as_str(),
        )
        .ok();
    }

    out
}

/// Truncate on char boundaries; signatures may carry accented prefixes.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    if width <= 3 {
        return s.chars().take(width).collect();
    }
    let head: String = s.chars().take(width - 3).collect();
    format!("{head}...")
}
