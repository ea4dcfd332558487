//! Error types for frame element operations

use thiserror::Error;

/// Main error type for element, section and serialization operations
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Trial state rejected by {failed} of {total} sections")]
    RejectedTrial { failed: usize, total: usize },

    #[error("Serialization mismatch: {0}")]
    SerializationMismatch(String),

    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("Could not create object: {0}")]
    AllocationFailure(String),

    #[error("Commit failed for {failed} sub-objects")]
    CommitFailed { failed: usize },

    #[error("No constructor registered for {kind} class tag {tag}")]
    UnknownClassTag { kind: &'static str, tag: usize },

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Node {0} not found in domain")]
    NodeNotFound(usize),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for frame element operations
pub type FrameResult<T> = Result<T, FrameError>;
