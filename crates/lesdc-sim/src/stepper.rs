//! Batch stepper: folds the LES/CEML heuristics over the request sequence.
//!
//! One `step` call consumes `[cursor, min(cursor + batch_size, len))`. For each
//! request:
//! 1. the basic policy is charged the fixed cost;
//! 2. a redundant request (CEML probe hit) is charged 10% of it;
//! 3. a fresh request decays the run entropy (x0.99, floored at 0.1), stores
//!    its signature, and is charged `cost * (0.3 + 0.7 * run_entropy)`.
//!
//! Calls are synchronous and bounded; the caller decides when the next one
//! happens.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lesdc_core::{RequestSequence, compress, entropy, is_redundant};

use crate::config::{CompressionSource, SimConfig};
use crate::state::{RunPhase, RunState};

/// Trailing characters of a request shown in the step description.
const DESCRIPTION_TAIL_CHARS: usize = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepError {
    #[error("run already complete at cursor {cursor}; reset before stepping again")]
    AlreadyComplete { cursor: usize },
    #[error("batch size must be positive")]
    ZeroBatch,
    #[error("cursor {cursor} is past the end of a {len}-request sequence")]
    CursorOutOfBounds { cursor: usize, len: usize },
}

/// What happened to a single request under the optimized policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RequestOutcome {
    /// Probe signature already in memory.
    Redundant { cost: f64 },
    /// New work: run entropy decayed and a signature was stored.
    Fresh {
        signature: String,
        /// Per-request motif estimate. Does not enter the cost.
        text_entropy: f64,
        /// Run entropy after this request's decay step.
        run_entropy: f64,
        cost: f64,
    },
}

impl RequestOutcome {
    #[must_use]
    pub fn cost(&self) -> f64 {
        match self {
            Self::Redundant { cost } | Self::Fresh { cost, .. } => *cost,
        }
    }

    #[must_use]
    pub fn is_redundant(&self) -> bool {
        matches!(self, Self::Redundant { .. })
    }
}

/// Observational result of one `step` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub basic_total: f64,
    pub optimized_total: f64,
    /// Run entropy after the batch.
    pub entropy: f64,
    pub memory_size: usize,
    pub cursor: usize,
    pub total: usize,
    pub phase: RunPhase,
    /// Requests consumed by this call.
    pub processed: usize,
    pub fresh_in_batch: usize,
    pub redundant_in_batch: usize,
    /// Full text of the last request in the batch.
    pub last_request: String,
    /// Motif estimate of the last request, when it was fresh.
    pub last_text_entropy: Option<f64>,
}

impl StepSnapshot {
    /// `cursor / total`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.cursor as f64 / self.total as f64
        }
    }

    /// `Processed: ...<last 15 characters>`.
    #[must_use]
    pub fn description(&self) -> String {
        let chars: Vec<char> = self.last_request.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(DESCRIPTION_TAIL_CHARS)..]
            .iter()
            .collect();
        format!("Processed: ...{tail}")
    }

    /// `Entropy: x.xxxx`.
    #[must_use]
    pub fn details(&self) -> String {
        format!("Entropy: {:.4}", self.entropy)
    }
}

/// Charge one request to both policies and update `state`.
///
/// Does not touch the cursor.
pub fn process_request(config: &SimConfig, state: &mut RunState, text: &str) -> RequestOutcome {
    state.basic_total += config.energy_per_request;

    if is_redundant(text, &state.memory) {
        let cost = config.energy_per_request * config.redundancy_discount;
        state.optimized_total += cost;
        state.redundant_hits += 1;
        return RequestOutcome::Redundant { cost };
    }

    state.entropy = (state.entropy * config.decay_factor).max(config.entropy_floor);

    // Known oddity: the per-request estimate is computed but only the decaying
    // run entropy drives the cost, and in faithful mode the signature too.
    let text_entropy = entropy(text);
    let compression_entropy = match config.compression_source {
        CompressionSource::DecayingState => state.entropy,
        CompressionSource::PerText => text_entropy,
    };
    let signature = compress(text, compression_entropy);
    state.memory.insert(signature.clone());

    let entropy_share = 1.0 - config.base_cost_ratio;
    let cost = config.energy_per_request * (config.base_cost_ratio + entropy_share * state.entropy);
    state.optimized_total += cost;
    state.fresh_requests += 1;

    RequestOutcome::Fresh {
        signature,
        text_entropy,
        run_entropy: state.entropy,
        cost,
    }
}

/// Advance `state` by one batch of `batch_size` requests with default costs.
pub fn step(
    sequence: &RequestSequence,
    state: &mut RunState,
    batch_size: usize,
) -> Result<StepSnapshot, StepError> {
    step_with(&SimConfig::with_batch_size(batch_size), sequence, state)
}

/// Advance `state` by one batch using `config`.
pub fn step_with(
    config: &SimConfig,
    sequence: &RequestSequence,
    state: &mut RunState,
) -> Result<StepSnapshot, StepError> {
    step_observed(config, sequence, state, |_, _, _| {})
}

/// Like [`step_with`], calling `observer(index, text, outcome)` per request.
pub fn step_observed<F>(
    config: &SimConfig,
    sequence: &RequestSequence,
    state: &mut RunState,
    mut observer: F,
) -> Result<StepSnapshot, StepError>
where
    F: FnMut(usize, &str, &RequestOutcome),
{
    let len = sequence.len();
    if config.batch_size == 0 {
        return Err(StepError::ZeroBatch);
    }
    if state.cursor > len {
        return Err(StepError::CursorOutOfBounds {
            cursor: state.cursor,
            len,
        });
    }
    if state.phase == RunPhase::Complete || state.cursor == len {
        return Err(StepError::AlreadyComplete {
            cursor: state.cursor,
        });
    }

    let start = state.cursor;
    let end = start.saturating_add(config.batch_size).min(len);
    let mut fresh_in_batch = 0;
    let mut redundant_in_batch = 0;
    let mut last_text_entropy = None;

    for (offset, text) in sequence.window(start, end).iter().enumerate() {
        let outcome = process_request(config, state, text);
        match &outcome {
            RequestOutcome::Redundant { .. } => {
                redundant_in_batch += 1;
                last_text_entropy = None;
            }
            RequestOutcome::Fresh { text_entropy, .. } => {
                fresh_in_batch += 1;
                last_text_entropy = Some(*text_entropy);
            }
        }
        observer(start + offset, text, &outcome);
    }

    state.cursor = end;
    state.phase = if end == len {
        RunPhase::Complete
    } else {
        RunPhase::Running
    };

    Ok(StepSnapshot {
        basic_total: state.basic_total,
        optimized_total: state.optimized_total,
        entropy: state.entropy,
        memory_size: state.memory.len(),
        cursor: state.cursor,
        total: len,
        phase: state.phase,
        processed: end - start,
        fresh_in_batch,
        redundant_in_batch,
        last_request: sequence.get(end - 1).unwrap_or_default().to_string(),
        last_text_entropy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesdc_core::generate;

    #[test]
    fn first_step_consumes_one_batch() {
        let seq = generate();
        let mut state = RunState::new();
        let snap = step(&seq, &mut state, 10).unwrap();
        assert_eq!(snap.cursor, 10);
        assert_eq!(snap.processed, 10);
        assert_eq!(snap.phase, RunPhase::Running);
        assert_eq!(snap.basic_total, 100.0);
        assert_eq!(snap.fresh_in_batch, 10);
        assert_eq!(snap.redundant_in_batch, 0);
        assert_eq!(snap.memory_size, 4);
        assert!((snap.entropy - 0.99_f64.powi(10)).abs() < 1e-12);
        assert!((snap.optimized_total - 96.263_222_018_898_49).abs() < 1e-9);
        assert_eq!(
            snap.last_request,
            "FC-496 protocole pour data center quantique craid_9"
        );
    }

    #[test]
    fn early_fresh_requests_store_prefix_signatures() {
        let seq = generate();
        let mut state = RunState::new();
        step(&seq, &mut state, 4).unwrap();
        let listed: Vec<&str> = state.memory().iter().collect();
        assert_eq!(
            listed,
            vec!["COMP_CEML ", "COMP_FC-49", "COMP_Génér", "COMP_Optim"]
        );
    }

    #[test]
    fn redundant_request_costs_a_tenth() {
        let config = SimConfig::default();
        let mut state = RunState::new();
        state.memory.insert(String::from("qubit"));
        let outcome = process_request(
            &config,
            &mut state,
            "Générer architecture low-power avec Lichen-OS qubit_3",
        );
        assert_eq!(outcome, RequestOutcome::Redundant { cost: 1.0 });
        assert_eq!(state.entropy(), 1.0);
        assert_eq!(state.basic_total(), 10.0);
        assert_eq!(state.optimized_total(), 1.0);
        assert_eq!(state.memory().len(), 1);
    }

    #[test]
    fn fresh_request_decays_before_costing() {
        let config = SimConfig::default();
        let mut state = RunState::new();
        let outcome = process_request(
            &config,
            &mut state,
            "Optimiser qubit avec spin-locking et kuramoto fc-496_0",
        );
        let RequestOutcome::Fresh {
            signature,
            text_entropy,
            run_entropy,
            cost,
        } = outcome
        else {
            panic!("expected fresh outcome");
        };
        assert_eq!(signature, "COMP_Optim");
        assert_eq!(text_entropy, 1.0);
        assert!((run_entropy - 0.99).abs() < 1e-15);
        assert!((cost - 10.0 * (0.3 + 0.7 * 0.99)).abs() < 1e-12);
    }

    #[test]
    fn run_entropy_is_floored() {
        let config = SimConfig::default();
        let mut state = RunState::new();
        state.entropy = 0.1;
        process_request(&config, &mut state, "unseen text");
        assert_eq!(state.entropy(), 0.1);
    }

    #[test]
    fn per_text_mode_uses_request_estimate() {
        let config = SimConfig::default().with_compression_source(CompressionSource::PerText);
        let mut state = RunState::new();
        let outcome = process_request(
            &config,
            &mut state,
            "Générer architecture low-power avec Lichen-OS qubit_3",
        );
        match outcome {
            RequestOutcome::Fresh { signature, .. } => assert_eq!(signature, "qubit"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn zero_batch_is_rejected_without_side_effects() {
        let seq = generate();
        let mut state = RunState::new();
        assert_eq!(step(&seq, &mut state, 0), Err(StepError::ZeroBatch));
        assert_eq!(state, RunState::new());
    }

    #[test]
    fn cursor_past_end_is_a_contract_violation() {
        let seq = generate();
        let mut state = RunState::new();
        state.cursor = 1001;
        assert_eq!(
            step(&seq, &mut state, 10),
            Err(StepError::CursorOutOfBounds {
                cursor: 1001,
                len: 1000
            })
        );
    }

    #[test]
    fn last_batch_is_partial() {
        let seq = generate();
        let mut state = RunState::new();
        let mut last = None;
        while state.phase() != RunPhase::Complete {
            last = Some(step(&seq, &mut state, 300).unwrap());
        }
        let last = last.unwrap();
        assert_eq!(last.processed, 100);
        assert_eq!(last.cursor, 1000);
    }

    #[test]
    fn observer_sees_every_request_in_order() {
        let seq = generate();
        let mut state = RunState::new();
        let mut seen = Vec::new();
        step_observed(
            &SimConfig::with_batch_size(7),
            &seq,
            &mut state,
            |idx, text, outcome| {
                seen.push((idx, text.to_string(), outcome.is_redundant()));
            },
        )
        .unwrap();
        assert_eq!(seen.len(), 7);
        for (i, (idx, text, redundant)) in seen.iter().enumerate() {
            assert_eq!(*idx, i);
            assert_eq!(text, &seq[i]);
            assert!(!redundant);
        }
    }

    #[test]
    fn description_and_details() {
        let seq = generate();
        let mut state = RunState::new();
        let snap = step(&seq, &mut state, 10).unwrap();
        assert_eq!(snap.description(), "Processed: ...antique craid_9");
        assert_eq!(snap.details(), "Entropy: 0.9044");
        assert_eq!(snap.progress(), 0.01);
    }
}
