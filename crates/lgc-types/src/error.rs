use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid entity identifier: {0:?}")]
    InvalidEntityId(String),

    #[error("invalid stream identifier: {0:?}")]
    InvalidStreamId(String),

    #[error("invalid commit identifier: {0}")]
    InvalidCommitId(String),
}
