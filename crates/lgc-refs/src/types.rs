//! Commit records and their inputs.

use chrono::{DateTime, Utc};
use lgc_types::{CommitId, ObjectId, StreamId};
use serde::{Deserialize, Serialize};

/// An immutable entry in a branch's history.
///
/// `id` and `created_at` are assigned by the service; everything else comes
/// from the [`CommitCreateInput`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub stream: StreamId,
    pub branch: String,
    /// Root hash of the published object graph.
    pub object_id: ObjectId,
    pub message: String,
    pub source_application: String,
    /// The branch head this commit was appended to, if any.
    pub parent: Option<CommitId>,
    pub created_at: DateTime<Utc>,
}

/// Everything a caller supplies to create a commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitCreateInput {
    pub stream: StreamId,
    pub branch: String,
    pub object_id: ObjectId,
    pub message: String,
    pub source_application: String,
    /// When set, the commit is only created if the branch head still equals
    /// this value (`Some(None)` meaning "the branch has no commits").
    pub expected_head: Option<Option<CommitId>>,
}

impl CommitCreateInput {
    pub fn new(
        stream: StreamId,
        branch: impl Into<String>,
        object_id: ObjectId,
        message: impl Into<String>,
        source_application: impl Into<String>,
    ) -> Self {
        Self {
            stream,
            branch: branch.into(),
            object_id,
            message: message.into(),
            source_application: source_application.into(),
            expected_head: None,
        }
    }

    /// Guard the commit against concurrent publishers.
    pub fn expecting_head(mut self, head: Option<CommitId>) -> Self {
        self.expected_head = Some(head);
        self
    }
}

/// Summary information about a branch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    pub head: Option<CommitId>,
    pub commit_count: usize,
}
