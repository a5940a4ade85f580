//! CEML redundancy detection.
//!
//! A request is redundant when its probe signature, `compress(text, 0.5)`, is
//! already in memory. The probe entropy is fixed and independent of the
//! decaying run entropy.

use std::collections::BTreeSet;

use crate::signature::compress;

/// Entropy used to derive the lookup signature.
pub const REDUNDANCY_PROBE_ENTROPY: f64 = 0.5;

/// Set of signatures stored by a run.
///
/// Ordered so listings are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureMemory {
    signatures: BTreeSet<String>,
}

impl SignatureMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a signature. Returns false if it was already present.
    pub fn insert(&mut self, signature: String) -> bool {
        self.signatures.insert(signature)
    }

    #[must_use]
    pub fn contains(&self, signature: &str) -> bool {
        self.signatures.contains(signature)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn clear(&mut self) {
        self.signatures.clear();
    }

    /// Signatures in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.signatures.iter().map(String::as_str)
    }
}

/// True if the probe signature of `text` is in `memory`.
#[must_use]
pub fn is_redundant(text: &str, memory: &SignatureMemory) -> bool {
    memory.contains(&compress(text, REDUNDANCY_PROBE_ENTROPY))
}
