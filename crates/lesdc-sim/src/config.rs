//! Simulation configuration.
//!
//! Every cost constant of the two energy policies lives in [`SimConfig`].
//! Two environment variables override the defaults:
//! - `LESDC_BATCH_SIZE`: requests consumed per tick (positive integer, default 10).
//! - `LESDC_MODE`: which entropy feeds fresh-request compression.
//!   `faithful` (default) uses the decaying run entropy; `per-text` uses the
//!   per-request estimate, as the first demo did.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_BATCH_SIZE: &str = "LESDC_BATCH_SIZE";
pub const ENV_MODE: &str = "LESDC_MODE";

/// Entropy value handed to the signature compressor for fresh requests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionSource {
    /// The decaying run entropy, after this request's decay step.
    #[default]
    DecayingState,
    /// The per-request motif estimate.
    PerText,
}

impl CompressionSource {
    /// Parse from string (case-insensitive). Unknown values map to the default.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    /// Strict parse; `None` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "faithful" | "default" | "state" | "decaying-state" => Some(Self::DecayingState),
            "per-text" | "pertext" | "text" | "legacy" => Some(Self::PerText),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DecayingState => "faithful",
            Self::PerText => "per-text",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: expected a positive integer, got '{value}'")]
    InvalidBatchSize { var: &'static str, value: String },
    #[error("{var}: expected faithful|per-text, got '{value}'")]
    InvalidMode { var: &'static str, value: String },
}

/// Cost model and driver parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Basic-policy cost of one request.
    pub energy_per_request: f64,
    /// Requests processed per `step` call.
    pub batch_size: usize,
    /// Multiplier applied to the run entropy for each fresh request.
    pub decay_factor: f64,
    /// Lower clamp of the run entropy.
    pub entropy_floor: f64,
    /// Share of the fixed cost charged for a redundant request.
    pub redundancy_discount: f64,
    /// Entropy-independent share of a fresh request's cost.
    pub base_cost_ratio: f64,
    /// Lines kept by the driver's trailing log.
    pub trail_capacity: usize,
    pub compression_source: CompressionSource,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            energy_per_request: 10.0,
            batch_size: 10,
            decay_factor: 0.99,
            entropy_floor: 0.1,
            redundancy_discount: 0.1,
            base_cost_ratio: 0.3,
            trail_capacity: 5,
            compression_source: CompressionSource::DecayingState,
        }
    }
}

impl SimConfig {
    /// Defaults with the given batch size.
    #[must_use]
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_compression_source(mut self, source: CompressionSource) -> Self {
        self.compression_source = source;
        self
    }

    /// Read overrides from the process environment, ignoring bad values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup_loose(|key| std::env::var(key).ok())
    }

    /// Read overrides from the process environment, rejecting bad values.
    pub fn from_env_strict() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup, ignoring bad values.
    #[must_use]
    pub fn from_lookup_loose(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(size) = lookup(ENV_BATCH_SIZE).and_then(|raw| parse_batch_size(&raw)) {
            config.batch_size = size;
        }
        if let Some(raw) = lookup(ENV_MODE) {
            config.compression_source = CompressionSource::from_str_loose(&raw);
        }
        config
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_BATCH_SIZE) {
            config.batch_size =
                parse_batch_size(&raw).ok_or_else(|| ConfigError::InvalidBatchSize {
                    var: ENV_BATCH_SIZE,
                    value: raw.clone(),
                })?;
        }
        if let Some(raw) = lookup(ENV_MODE) {
            config.compression_source =
                CompressionSource::parse(&raw).ok_or_else(|| ConfigError::InvalidMode {
                    var: ENV_MODE,
                    value: raw.clone(),
                })?;
        }
        Ok(config)
    }
}

fn parse_batch_size(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn defaults_match_cost_model() {
        let c = SimConfig::default();
        assert_eq!(c.energy_per_request, 10.0);
        assert_eq!(c.batch_size, 10);
        assert_eq!(c.decay_factor, 0.99);
        assert_eq!(c.entropy_floor, 0.1);
        assert_eq!(c.redundancy_discount, 0.1);
        assert_eq!(c.base_cost_ratio, 0.3);
        assert_eq!(c.trail_capacity, 5);
        assert_eq!(c.compression_source, CompressionSource::DecayingState);
    }

    #[test]
    fn parse_compression_sources() {
        assert_eq!(
            CompressionSource::from_str_loose("faithful"),
            CompressionSource::DecayingState
        );
        assert_eq!(
            CompressionSource::from_str_loose("PER-TEXT"),
            CompressionSource::PerText
        );
        assert_eq!(
            CompressionSource::from_str_loose("legacy"),
            CompressionSource::PerText
        );
        assert_eq!(
            CompressionSource::from_str_loose("bogus"),
            CompressionSource::DecayingState
        );
        assert_eq!(CompressionSource::parse("bogus"), None);
    }

    #[test]
    fn as_str_round_trips_through_parse() {
        for source in [CompressionSource::DecayingState, CompressionSource::PerText] {
            assert_eq!(CompressionSource::parse(source.as_str()), Some(source));
        }
    }

    #[test]
    fn lookup_overrides() {
        let c = SimConfig::from_lookup(lookup_from(&[
            (ENV_BATCH_SIZE, "25"),
            (ENV_MODE, "per-text"),
        ]))
        .unwrap();
        assert_eq!(c.batch_size, 25);
        assert_eq!(c.compression_source, CompressionSource::PerText);
    }

    #[test]
    fn strict_lookup_rejects_zero_batch() {
        let err = SimConfig::from_lookup(lookup_from(&[(ENV_BATCH_SIZE, "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidBatchSize {
                var: ENV_BATCH_SIZE,
                value: String::from("0"),
            }
        );
    }

    #[test]
    fn strict_lookup_rejects_unknown_mode() {
        let err = SimConfig::from_lookup(lookup_from(&[(ENV_MODE, "turbo")])).unwrap_err();
        assert!(err.to_string().contains("turbo"));
    }

    #[test]
    fn loose_lookup_falls_back() {
        let c = SimConfig::from_lookup_loose(lookup_from(&[
            (ENV_BATCH_SIZE, "ten"),
            (ENV_MODE, "turbo"),
        ]));
        assert_eq!(c, SimConfig::default());
    }
}
