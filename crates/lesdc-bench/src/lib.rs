//! Shared helpers for the LES simulation benchmarks.
//!
//! Benches record per-op samples through [`BenchStats`] and print one
//! machine-greppable summary line per measurement:
//! `LESDC_BENCH mode=<mode> bench=<name> samples=.. p50_ns_op=.. ...`

#![forbid(unsafe_code)]

use std::time::Duration;

use lesdc_core::RequestSequence;
use lesdc_sim::{CompressionSource, SimConfig};

#[derive(Debug, Default)]
pub struct BenchStats {
    samples_ns_per_op: Vec<f64>,
    total_iters: u64,
    total_ns: u128,
}

impl BenchStats {
    pub fn record(&mut self, iters: u64, dur: Duration) {
        let ns = dur.as_nanos();
        self.total_iters = self.total_iters.saturating_add(iters);
        self.total_ns = self.total_ns.saturating_add(ns);
        self.samples_ns_per_op.push(ns as f64 / iters.max(1) as f64);
    }

    #[must_use]
    pub fn summary_line(&self, mode_label: &str, bench_label: &str) -> Option<String> {
        if self.samples_ns_per_op.is_empty() {
            return None;
        }
        let mut samples = self.samples_ns_per_op.clone();
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let p50 = percentile_sorted(&samples, 0.50);
        let p95 = percentile_sorted(&samples, 0.95);
        let p99 = percentile_sorted(&samples, 0.99);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let throughput_ops_s = if self.total_ns == 0 {
            0.0
        } else {
            (self.total_iters as f64) / (self.total_ns as f64 / 1e9)
        };

        Some(format!(
            "LESDC_BENCH mode={mode_label} bench={bench_label} samples={} p50_ns_op={p50:.3} p95_ns_op={p95:.3} p99_ns_op={p99:.3} mean_ns_op={mean:.3} throughput_ops_s={throughput_ops_s:.3}",
            samples.len(),
        ))
    }

    pub fn report(&self, mode_label: &str, bench_label: &str) {
        if let Some(line) = self.summary_line(mode_label, bench_label) {
            println!("{line}");
        }
    }
}

#[must_use]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    debug_assert!((0.0..=1.0).contains(&p));
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Bench config from `LESDC_MODE` / `LESDC_BATCH_SIZE`, ignoring bad values.
#[must_use]
pub fn bench_config() -> SimConfig {
    SimConfig::from_env()
}

#[must_use]
pub fn mode_label(config: &SimConfig) -> &'static str {
    config.compression_source.as_str()
}

/// One request per base template, in sequence order.
#[must_use]
pub fn sample_requests(sequence: &RequestSequence) -> Vec<String> {
    sequence.iter().take(4).map(str::to_string).collect()
}

/// Both compression modes with default costs.
#[must_use]
pub fn all_modes() -> [SimConfig; 2] {
    [
        SimConfig::default(),
        SimConfig::default().with_compression_source(CompressionSource::PerText),
    ]
}

pub fn print_env_metadata_once() {
    static ONCE: std::sync::Once = std::sync::Once::new();
    ONCE.call_once(|| {
        let mode_raw = std::env::var("LESDC_MODE").unwrap_or_else(|_| "<unset>".to_string());
        let batch_raw =
            std::env::var("LESDC_BATCH_SIZE").unwrap_or_else(|_| "<unset>".to_string());
        let cpu = cpu_model().unwrap_or_else(|| "<unknown>".to_string());
        println!("LESDC_BENCH_META lesdc_mode_env={mode_raw}");
        println!("LESDC_BENCH_META lesdc_batch_size_env={batch_raw}");
        println!("LESDC_BENCH_META cpu_model={cpu}");
    });
}

fn cpu_model() -> Option<String> {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    for line in cpuinfo.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("model name") {
            let rest = rest.trim_start_matches(':').trim();
            if !rest.is_empty() {
                return Some(rest.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_pick_nearest_rank() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(percentile_sorted(&sorted, 0.5), 3.0);
        assert_eq!(percentile_sorted(&sorted, 1.0), 5.0);
        assert_eq!(percentile_sorted(&[], 0.5), 0.0);
    }

    #[test]
    fn stats_summary_line() {
        let mut stats = BenchStats::default();
        assert!(stats.summary_line("faithful", "entropy").is_none());
        stats.record(10, Duration::from_nanos(1000));
        stats.record(10, Duration::from_nanos(3000));
        let line = stats.summary_line("faithful", "entropy").unwrap();
        assert!(line.starts_with("LESDC_BENCH mode=faithful bench=entropy samples=2 "));
        assert!(line.contains("mean_ns_op=200.000"));
    }

    #[test]
    fn samples_cover_each_template() {
        let seq = lesdc_core::generate();
        let samples = sample_requests(&seq);
        assert_eq!(samples.len(), 4);
        assert!(samples[3].ends_with("qubit_3"));
    }
}
