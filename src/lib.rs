//! Deterministic aggregate signing over a concurrent stage pipeline
//!
//! Input items flow through three concurrent stages connected by bounded
//! streams: [`SingleHashStage`] signs each item through a serialized slow
//! primitive and brackets it with fast checksums, [`MultiHashStage`]
//! widens each result into an index-ordered fan-out of checksums, and
//! [`CombineResultsStage`] sorts everything and joins it into the one
//! final signature. Stages emit in completion order; the terminal sort is
//! the only place cross-item order is imposed, which makes the output
//! deterministic for any permutation of the input.
//!
//! [`SingleHashStage`]: pipeline::stages::SingleHashStage
//! [`MultiHashStage`]: pipeline::stages::MultiHashStage
//! [`CombineResultsStage`]: pipeline::stages::CombineResultsStage

pub mod error;
pub mod hasher;
pub mod pipeline;
pub mod signer;
pub mod value;

// Re-export main types
pub use error::{SignerError, SignerResult};
pub use signer::sign_items;
pub use value::Value;
