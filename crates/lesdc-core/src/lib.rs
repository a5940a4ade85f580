//! # lesdc-core
//!
//! Pure scoring heuristics behind the LES data center simulation.
//!
//! This crate provides:
//! - **Request generator** (`request`): the fixed synthetic request corpus
//! - **Entropy estimator** (`entropy`): Low-Entropy Spiral (LES) motif score
//! - **Signature compressor** (`signature`): LES request signatures
//! - **Redundancy detector** (`redundancy`): Cognitive Entropy Minimization
//!   Loop (CEML) memory lookup
//!
//! Everything here is deterministic and side-effect free. Run state lives in
//! `lesdc-sim`.

#![deny(unsafe_code)]

pub mod entropy;
pub mod redundancy;
pub mod request;
pub mod signature;

pub use entropy::entropy;
pub use redundancy::{REDUNDANCY_PROBE_ENTROPY, SignatureMemory, is_redundant};
pub use request::{BASE_TEMPLATES, REPETITIONS, RequestSequence, generate};
pub use signature::compress;
