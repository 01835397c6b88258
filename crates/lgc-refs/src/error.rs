//! Error types for commit service operations.

use lgc_types::{CommitId, StreamId};
use thiserror::Error;

/// Errors that can occur while reading or extending commit history.
#[derive(Debug, Error)]
pub enum RefError {
    #[error("stream not found: {stream}")]
    StreamNotFound { stream: StreamId },

    #[error("stream already exists: {stream}")]
    StreamExists { stream: StreamId },

    /// Commits are only ever created on branches that already exist.
    #[error("branch not found: {stream}/{branch}")]
    BranchNotFound { stream: StreamId, branch: String },

    #[error("branch already exists: {stream}/{branch}")]
    BranchExists { stream: StreamId, branch: String },

    #[error("invalid branch name: {name}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// The branch head moved since the caller last observed it.
    #[error("branch {branch} moved: expected head {}, found {}", display_head(.expected), display_head(.actual))]
    Conflict {
        branch: String,
        expected: Option<CommitId>,
        actual: Option<CommitId>,
    },

    #[error("commit service unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_head(head: &Option<CommitId>) -> String {
    head.map_or_else(|| "<none>".to_string(), |id| id.to_string())
}

/// Convenience type alias for commit service operations.
pub type Result<T> = std::result::Result<T, RefError>;
