use thiserror::Error;

/// Central error type for the data-signing pipeline
#[derive(Error, Debug)]
pub enum SignerError {
    // ============================================================================
    // Pipeline Errors
    // ============================================================================
    #[error("Stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    #[error("Stage '{0}' could not emit: downstream stream is closed")]
    StreamClosed(String),

    #[error("Worker task failed: {0}")]
    WorkerJoin(String),

    #[error("Pipeline did not produce exactly one terminal result")]
    MissingOutput,

    // ============================================================================
    // Hash Primitive Errors
    // ============================================================================
    #[error("Hash primitive failed: {0}")]
    PrimitiveFailed(String),
}

/// Result type alias using SignerError
pub type SignerResult<T> = Result<T, SignerError>;
