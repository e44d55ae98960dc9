//! Pipeline pattern implementation for concurrent stream transformations
//!
//! This module provides the pipeline system for running a fixed chain of
//! concurrent stages connected by bounded streams. Each stage consumes a
//! stream of values, fans work out across per-item workers, and emits
//! results downstream; the executor owns the streams and the stage
//! lifetimes and blocks until the whole chain has drained.
//!
//! # Example
//! ```no_run
//! use datasigner::pipeline::stages::{
//!     CombineResultsStage, MultiHashStage, SingleHashStage,
//! };
//! use datasigner::hasher::{Blake3Hasher, Hasher, SerializedHasher, Sha256Hasher};
//! use datasigner::pipeline::Pipeline;
//! use datasigner::Value;
//! use std::sync::Arc;
//!
//! # async fn demo() -> datasigner::SignerResult<()> {
//! let slow = SerializedHasher::new(Arc::new(Sha256Hasher::new()));
//! let fast: Arc<dyn Hasher> = Arc::new(Blake3Hasher::new());
//!
//! let pipeline = Pipeline::builder("data-signer")
//!     .add_stage(SingleHashStage::new(slow, Arc::clone(&fast)))
//!     .add_stage(MultiHashStage::new(fast))
//!     .add_stage(CombineResultsStage::new())
//!     .build();
//!
//! let outputs = pipeline
//!     .execute((0..10).map(Value::from).collect())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod executor;
pub mod stages;

// Re-export main types
pub use self::core::{PipelineStage, StageInput, StageOutput, DEFAULT_CHANNEL_CAPACITY};
pub use executor::{Pipeline, PipelineBuilder};
