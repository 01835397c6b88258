//! The [`CommitService`] trait: the remote store's commit API.

use async_trait::async_trait;
use lgc_types::StreamId;

use crate::error::Result;
use crate::types::{BranchInfo, Commit, CommitCreateInput};

/// Commit history of a remote store.
///
/// Implementations must make `create_commit` atomic with respect to the
/// branch pointer: two concurrent commits on one branch both land, in some
/// order, or the one whose `expected_head` no longer matches fails with
/// [`RefError::Conflict`](crate::RefError::Conflict). A failed commit never
/// moves the branch.
#[async_trait]
pub trait CommitService: Send + Sync {
    /// Create a stream with a single empty [`DEFAULT_BRANCH`](crate::DEFAULT_BRANCH).
    async fn create_stream(&self, stream: &StreamId) -> Result<()>;

    async fn create_branch(&self, stream: &StreamId, branch: &str) -> Result<()>;

    async fn list_branches(&self, stream: &StreamId) -> Result<Vec<BranchInfo>>;

    /// Latest commit on a branch, `None` for a branch without commits.
    async fn get_head(&self, stream: &StreamId, branch: &str) -> Result<Option<Commit>>;

    /// Append a commit to an existing branch.
    async fn create_commit(&self, input: CommitCreateInput) -> Result<Commit>;

    /// Branch history, newest first, at most `limit` entries.
    async fn log(&self, stream: &StreamId, branch: &str, limit: usize) -> Result<Vec<Commit>>;
}
