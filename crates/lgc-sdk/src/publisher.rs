//! Sending an assembled graph and recording it as a commit.

use std::fmt;
use std::sync::Arc;

use lgc_refs::{Commit, CommitCreateInput, CommitService};
use lgc_store::{ContentStore, UploadReport};
use lgc_types::{CommitId, ObjectNode, StreamId};
use tracing::{debug, info, warn};

use crate::config::PublishConfig;
use crate::error::PublishError;

/// Lifecycle of one publish.
///
/// `Built → Sending → Sent → CommitPending → Committed`, or `Failed` from
/// `Sending` or `CommitPending`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishState {
    Built,
    Sending,
    Sent,
    CommitPending,
    Committed,
    Failed,
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Built => "built",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::CommitPending => "commit-pending",
            Self::Committed => "committed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Destination and labels of a commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishTarget {
    pub stream: StreamId,
    pub branch: String,
    pub message: String,
    pub source_tag: String,
    /// See [`CommitCreateInput::expected_head`].
    pub expected_head: Option<Option<CommitId>>,
}

impl From<&PublishConfig> for PublishTarget {
    fn from(config: &PublishConfig) -> Self {
        Self {
            stream: config.stream_id.clone(),
            branch: config.branch_name.clone(),
            message: config.message.clone(),
            source_tag: config.source_tag.clone(),
            expected_head: config.expected_head.map(Some),
        }
    }
}

/// A successful publish.
#[derive(Clone, Debug)]
pub struct Published {
    pub commit: Commit,
    pub upload: UploadReport,
}

/// Uploads graphs and creates commits for them.
///
/// Both remote services are explicit constructor inputs; nothing is read
/// from process-wide state. Each call to [`publish`](Self::publish) makes a
/// single attempt with no retries.
#[derive(Clone)]
pub struct CommitPublisher {
    content: Arc<dyn ContentStore>,
    commits: Arc<dyn CommitService>,
}

impl CommitPublisher {
    pub fn new(content: Arc<dyn ContentStore>, commits: Arc<dyn CommitService>) -> Self {
        Self { content, commits }
    }

    pub fn content(&self) -> &Arc<dyn ContentStore> {
        &self.content
    }

    pub fn commits(&self) -> &Arc<dyn CommitService> {
        &self.commits
    }

    /// Upload `graph` and append a commit for it to `target.branch`.
    ///
    /// The graph is consumed: once handed to the content store it belongs
    /// to the store. A transport failure means no commit-create call was
    /// made; a commit failure means the branch did not move.
    pub async fn publish(
        &self,
        graph: ObjectNode,
        target: &PublishTarget,
    ) -> Result<Published, PublishError> {
        let mut state = PublishState::Built;

        advance(&mut state, PublishState::Sending);
        let upload = match self.content.upload(&graph).await {
            Ok(report) => report,
            Err(e) => {
                advance(&mut state, PublishState::Failed);
                warn!(error = %e, "graph upload failed");
                return Err(PublishError::TransportFailure(e));
            }
        };
        drop(graph);
        advance(&mut state, PublishState::Sent);

        advance(&mut state, PublishState::CommitPending);
        let input = CommitCreateInput {
            stream: target.stream.clone(),
            branch: target.branch.clone(),
            object_id: upload.root,
            message: target.message.clone(),
            source_application: target.source_tag.clone(),
            expected_head: target.expected_head,
        };
        let commit = match self.commits.create_commit(input).await {
            Ok(commit) => commit,
            Err(source) => {
                advance(&mut state, PublishState::Failed);
                warn!(object = %upload.root.short_hex(), error = %source, "commit-create failed");
                return Err(PublishError::CommitFailure {
                    object: upload.root,
                    source,
                });
            }
        };
        advance(&mut state, PublishState::Committed);

        info!(
            commit = %commit.id.short_id(),
            object = %upload.root.short_hex(),
            stream = %commit.stream,
            branch = %commit.branch,
            written = upload.written,
            skipped = upload.skipped,
            "published layer group"
        );
        Ok(Published { commit, upload })
    }
}

fn advance(state: &mut PublishState, next: PublishState) {
    debug!(from = %state, to = %next, "publish state");
    *state = next;
}
