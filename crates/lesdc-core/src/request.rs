//! Synthetic request corpus.
//!
//! The sequence is the base template list repeated [`REPETITIONS`] times,
//! templates inner, with every element suffixed by `_<global index>`.

use std::ops::Index;

/// Base request templates, in emission order.
pub const BASE_TEMPLATES: [&str; 4] = [
    "Optimiser qubit avec spin-locking et kuramoto fc-496",
    "FC-496 protocole pour data center quantique craid",
    "CEML compression pour réduire entropie cognitive les",
    "Générer architecture low-power avec Lichen-OS qubit",
];

/// Number of times the template list is repeated.
pub const REPETITIONS: usize = 250;

/// Ordered, immutable request sequence.
///
/// Only [`generate`] builds one, so the length is always
/// `BASE_TEMPLATES.len() * REPETITIONS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSequence {
    requests: Vec<String>,
}

impl RequestSequence {
    /// Number of requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Always false for a generated sequence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Request at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.requests.get(index).map(String::as_str)
    }

    /// Requests in `[start, end)`. Bounds are clamped to the sequence length.
    #[must_use]
    pub fn window(&self, start: usize, end: usize) -> &[String] {
        let end = end.min(self.requests.len());
        let start = start.min(end);
        &self.requests[start..end]
    }

    /// Iterate requests in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.requests.iter().map(String::as_str)
    }
}

impl Index<usize> for RequestSequence {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.requests[index]
    }
}

/// Build the request sequence.
///
/// Element `4k + j` is `BASE_TEMPLATES[j]` followed by `_{4k + j}`.
#[must_use]
pub fn generate() -> RequestSequence {
    let width = BASE_TEMPLATES.len();
    let mut requests = Vec::with_capacity(width * REPETITIONS);
    for rep in 0..REPETITIONS {
        for (pos, template) in BASE_TEMPLATES.iter().enumerate() {
            let global_index = rep * width + pos;
            requests.push(format!("{template}_{global_index}"));
        }
    }
    RequestSequence { requests }
}
