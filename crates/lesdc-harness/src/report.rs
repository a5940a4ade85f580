//! Run report: the numbers the results panel shows, as text or JSON.

use std::fmt::Write as _;

use serde::Serialize;

use lesdc_sim::{RunPhase, RunSummary, SimConfig};

use crate::error::HarnessError;

/// Savings strictly above this percentage earn the validation banner.
pub const VALIDATION_THRESHOLD_PERCENT: f64 = 50.0;

const VALIDATION_BANNER: &str = "LES/CEML architecture validated for production deployment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
}

impl OutputFormat {
    #[must_use]
    pub fn from_str_loose(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "plain" | "text" => Some(Self::Plain),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, HarnessError> {
        Self::from_str_loose(raw).ok_or_else(|| HarnessError::UnknownFormat(raw.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: String,
    pub batch_size: usize,
    pub total_requests: usize,
    pub ticks: usize,
    pub progress_percent: f64,
    pub validated: bool,
    #[serde(flatten)]
    pub summary: RunSummary,
}

impl RunReport {
    #[must_use]
    pub fn new(config: &SimConfig, summary: RunSummary, total_requests: usize, ticks: usize) -> Self {
        let progress_percent = if total_requests == 0 {
            0.0
        } else {
            100.0 * summary.cursor as f64 / total_requests as f64
        };
        Self {
            mode: config.compression_source.as_str().to_string(),
            batch_size: config.batch_size,
            total_requests,
            ticks,
            progress_percent,
            validated: summary.phase == RunPhase::Complete
                && summary.savings_percent > VALIDATION_THRESHOLD_PERCENT,
            summary,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, HarnessError> {
        match format {
            OutputFormat::Plain => Ok(self.render_plain()),
            OutputFormat::Json => {
                let mut body = serde_json::to_string_pretty(self)?;
                body.push('\n');
                Ok(body)
            }
        }
    }

    #[must_use]
    pub fn render_plain(&self) -> String {
        let s = &self.summary;
        let mut out = String::new();
        writeln!(out, "LES data center simulation ({} mode)", self.mode).ok();
        writeln!(out, "{}", "-".repeat(44)).ok();
        writeln!(out, "{:<22} {:>12.1} units", "Standard energy", s.basic_total).ok();
        writeln!(out, "{:<22} {:>12.1} units", "Optimized energy", s.optimized_total).ok();
        writeln!(out, "{:<22} {:>12.1} %", "Total savings", s.savings_percent).ok();
        writeln!(out, "{:<22} {:>12.4}", "System entropy", s.entropy).ok();
        writeln!(out, "{:<22} {:>12} sigs", "Memory usage", s.memory_size).ok();
        writeln!(
            out,
            "{:<22} {:>12}",
            "Requests (fresh/dup)",
            format!("{}/{}", s.fresh_requests, s.redundant_hits)
        )
        .ok();
        writeln!(
            out,
            "{:<22} {:>12.0} % ({}/{}, {} ticks of {})",
            "Progress",
            self.progress_percent,
            s.cursor,
            self.total_requests,
            self.ticks,
            self.batch_size
        )
        .ok();
        writeln!(out, "{:<22} {:>12}", "Phase", s.phase.as_str()).ok();
        if self.validated {
            writeln!(out).ok();
            writeln!(out, "{VALIDATION_BANNER}").ok();
        }
        out
    }
}
