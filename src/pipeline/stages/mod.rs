//! Pipeline stages for the data-signing workflow
//!
//! This module contains the three stages that make up the signing pipeline:
//! 1. SingleHashStage - Sign each item and bracket it with fast checksums
//! 2. MultiHashStage - Widen each item into an index-ordered fan-out of checksums
//! 3. CombineResultsStage - Sort everything and join into the final signature

pub mod combine;
pub mod multi_hash;
pub mod single_hash;

// Re-export stages
pub use combine::{CombineResultsStage, RESULT_SEPARATOR};
pub use multi_hash::{MultiHashStage, DEFAULT_FAN_OUT};
pub use single_hash::SingleHashStage;
