//! LES motif entropy estimate.
//!
//! Each motif's occurrence count is divided by the text length to get a raw
//! weight. Weights are floored at [`WEIGHT_FLOOR`], renormalized, and fed to a
//! base-2 Shannon sum. The result is clamped to 1.0 and deliberately NOT
//! normalized against `log2(MOTIFS.len())`; most texts score far below 1.0.

/// Motifs scored by the estimator, in order.
pub const MOTIFS: [&str; 5] = ["qubit", "spin", "kuramoto", "fc-496", "craid"];

/// Lower bound applied to every raw weight before renormalization.
pub const WEIGHT_FLOOR: f64 = 1e-10;

/// Upper clamp of the estimate.
pub const ENTROPY_CEILING: f64 = 1.0;

/// Entropy score of `text`, in `(0, 1.0]`.
///
/// Counts are non-overlapping and case-insensitive. The divisor is the
/// character count of the input text. Empty text has no motif evidence
/// and scores `1.0`, the same value every motif-free text reaches.
#[must_use]
pub fn entropy(text: &str) -> f64 {
    let len = text.chars().count();
    if len == 0 {
        return ENTROPY_CEILING;
    }

    let lower = text.to_lowercase();
    let weights = MOTIFS.map(|motif| {
        let count = lower.matches(motif).count();
        (count as f64 / len as f64).max(WEIGHT_FLOOR)
    });

    let total: f64 = weights.iter().sum();
    let shannon: f64 = weights
        .iter()
        .map(|w| w / total)
        .filter(|p| *p > 0.0)
        .map(|p| p * p.log2())
        .sum();

    (-shannon).min(ENTROPY_CEILING)
}
