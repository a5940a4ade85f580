//! Integration test: full LES/CEML run over the generated corpus
//!
//! Validates that:
//! 1. A batch-10 run terminates in exactly 100 calls at cursor 1000.
//! 2. Final totals, run entropy and memory match the reference numbers.
//! 3. Stepping a complete run is rejected and changes nothing.
//! 4. Reset returns every field to its initial value.
//! 5. Batch size changes the call count, never the totals.
//! 6. Per-text compression mode yields its own reference numbers.
//!
//! Run: cargo test -p lesdc-sim --test full_run_test

use lesdc_core::generate;
use lesdc_sim::{
    CompressionSource, RunPhase, RunState, SimConfig, Simulation, StepError, reset, step, step_with,
};

const REFERENCE_OPTIMIZED: f64 = 1302.719_769_001_223_5;
const TOLERANCE: f64 = 1e-9;

fn full_run(batch_size: usize) -> (RunState, usize) {
    let seq = generate();
    let mut state = RunState::new();
    let mut calls = 0;
    while state.phase() != RunPhase::Complete {
        step(&seq, &mut state, batch_size).expect("step should succeed until complete");
        calls += 1;
    }
    (state, calls)
}

#[test]
fn batch_ten_run_takes_one_hundred_calls() {
    let seq = generate();
    let mut state = RunState::new();
    let mut calls = 0;
    loop {
        let snap = step(&seq, &mut state, 10).unwrap();
        calls += 1;
        assert!(snap.cursor <= 1000);
        assert_eq!(snap.cursor, calls * 10);
        if snap.phase == RunPhase::Complete {
            assert_eq!(snap.cursor, 1000);
            break;
        }
        assert_eq!(snap.phase, RunPhase::Running);
    }
    assert_eq!(calls, 100);
}

#[test]
fn final_totals_match_reference() {
    let (state, _) = full_run(10);
    assert_eq!(state.basic_total(), 10_000.0);
    assert!(
        (state.optimized_total() - REFERENCE_OPTIMIZED).abs() < TOLERANCE,
        "optimized = {}",
        state.optimized_total()
    );
    assert!(state.optimized_total() < state.basic_total());
    assert!((state.entropy() - 0.99_f64.powi(39)).abs() < 1e-12);
    assert_eq!(state.fresh_requests(), 39);
    assert_eq!(state.redundant_hits(), 961);
    let signatures: Vec<&str> = state.memory().iter().collect();
    assert_eq!(
        signatures,
        vec![
            "COMP_CEML ",
            "COMP_FC-49",
            "COMP_Génér",
            "COMP_Optim",
            "UNK_CEML ",
            "fc-496",
            "qubit",
            "qubit_spin_fc-496",
        ]
    );
}

#[test]
fn savings_clear_the_validation_threshold() {
    let (state, _) = full_run(10);
    let summary = state.summary();
    assert!(summary.savings_percent > 50.0);
    assert!((summary.savings_percent - 86.972_802_309_987_76).abs() < 1e-7);
    assert_eq!(summary.memory_size, 8);
}

#[test]
fn entropy_invariant_holds_every_step() {
    let seq = generate();
    let mut state = RunState::new();
    let mut previous_entropy = state.entropy();
    let mut previous_cursor = 0;
    while state.phase() != RunPhase::Complete {
        let snap = step(&seq, &mut state, 3).unwrap();
        assert!(snap.entropy > 0.0 && snap.entropy <= 1.0);
        assert!(snap.entropy <= previous_entropy);
        assert!(snap.cursor > previous_cursor);
        previous_entropy = snap.entropy;
        previous_cursor = snap.cursor;
    }
}

#[test]
fn stepping_after_complete_is_a_noop() {
    let seq = generate();
    let (mut state, _) = full_run(10);
    let before = state.clone();
    for _ in 0..3 {
        assert_eq!(
            step(&seq, &mut state, 10),
            Err(StepError::AlreadyComplete { cursor: 1000 })
        );
    }
    assert_eq!(state, before);
}

#[test]
fn reset_after_partial_and_complete_runs() {
    let seq = generate();
    let mut state = RunState::new();
    for _ in 0..5 {
        step(&seq, &mut state, 10).unwrap();
    }
    state.reset();
    assert_eq!(state, reset());
    assert_eq!(state.entropy(), 1.0);
    assert!(state.memory().is_empty());
    assert_eq!(state.cursor(), 0);
    assert_eq!(state.basic_total(), 0.0);
    assert_eq!(state.optimized_total(), 0.0);
    assert_eq!(state.phase(), RunPhase::Idle);

    let (mut state, _) = full_run(10);
    state.reset();
    assert_eq!(state, RunState::new());
}

#[test]
fn batch_size_only_changes_call_count() {
    let (reference, calls_10) = full_run(10);
    for (batch, expected_calls) in [(1, 1000), (7, 143), (250, 4), (5000, 1)] {
        let (state, calls) = full_run(batch);
        assert_eq!(calls, expected_calls, "batch {batch}");
        assert_eq!(state.basic_total(), reference.basic_total());
        assert!((state.optimized_total() - reference.optimized_total()).abs() < TOLERANCE);
        assert_eq!(state.entropy(), reference.entropy());
        assert_eq!(state.memory(), reference.memory());
    }
    assert_eq!(calls_10, 100);
}

#[test]
fn per_text_mode_reference() {
    let config = SimConfig::default().with_compression_source(CompressionSource::PerText);
    let seq = generate();
    let mut state = RunState::new();
    while state.phase() != RunPhase::Complete {
        step_with(&config, &seq, &mut state).unwrap();
    }
    assert_eq!(state.fresh_requests(), 751);
    assert_eq!(state.entropy(), 0.1);
    assert_eq!(state.memory().len(), 4);
    assert!((state.optimized_total() - 3491.026_629_136_729).abs() < 1e-8);
    assert!(state.optimized_total() < state.basic_total());
}

#[test]
fn simulation_wrapper_matches_free_functions() {
    let mut sim = Simulation::default();
    sim.run_to_completion().unwrap();
    let (state, _) = full_run(10);
    assert_eq!(sim.state(), &state);
}
