//! The namespace shared by every commit service backend.

use std::collections::BTreeMap;

use chrono::Utc;
use lgc_types::{CommitId, StreamId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RefError, Result};
use crate::names::{validate_branch_name, DEFAULT_BRANCH};
use crate::types::{BranchInfo, Commit, CommitCreateInput};

/// Streams → branches → append-only commit lists (oldest first).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct Namespace {
    streams: BTreeMap<StreamId, BTreeMap<String, Vec<Commit>>>,
}

impl Namespace {
    pub(crate) fn create_stream(&mut self, stream: &StreamId) -> Result<()> {
        if self.streams.contains_key(stream) {
            return Err(RefError::StreamExists {
                stream: stream.clone(),
            });
        }
        let mut branches = BTreeMap::new();
        branches.insert(DEFAULT_BRANCH.to_string(), Vec::new());
        self.streams.insert(stream.clone(), branches);
        debug!(stream = %stream, "created stream");
        Ok(())
    }

    pub(crate) fn create_branch(&mut self, stream: &StreamId, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        let branches = self.branches_mut(stream)?;
        if branches.contains_key(branch) {
            return Err(RefError::BranchExists {
                stream: stream.clone(),
                branch: branch.to_string(),
            });
        }
        branches.insert(branch.to_string(), Vec::new());
        debug!(stream = %stream, branch, "created branch");
        Ok(())
    }

    pub(crate) fn list_branches(&self, stream: &StreamId) -> Result<Vec<BranchInfo>> {
        Ok(self
            .branches(stream)?
            .iter()
            .map(|(name, history)| BranchInfo {
                name: name.clone(),
                head: history.last().map(|c| c.id),
                commit_count: history.len(),
            })
            .collect())
    }

    pub(crate) fn head(&self, stream: &StreamId, branch: &str) -> Result<Option<Commit>> {
        Ok(self.history(stream, branch)?.last().cloned())
    }

    /// Newest first, at most `limit` entries.
    pub(crate) fn log(&self, stream: &StreamId, branch: &str, limit: usize) -> Result<Vec<Commit>> {
        Ok(self
            .history(stream, branch)?
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    /// Append a commit. The check of `expected_head` and the append happen
    /// under the caller's exclusive borrow, so they are atomic with respect
    /// to other commits on the same namespace.
    pub(crate) fn commit(&mut self, input: CommitCreateInput) -> Result<Commit> {
        let stream = input.stream.clone();
        let branch_name = input.branch.clone();
        let history = self
            .branches_mut(&stream)?
            .get_mut(&branch_name)
            .ok_or_else(|| RefError::BranchNotFound {
                stream: stream.clone(),
                branch: branch_name.clone(),
            })?;

        let parent = history.last().map(|c| c.id);
        if let Some(expected) = input.expected_head {
            if expected != parent {
                warn!(
                    stream = %stream,
                    branch = %branch_name,
                    expected = ?expected,
                    actual = ?parent,
                    "branch head moved; refusing commit"
                );
                return Err(RefError::Conflict {
                    branch: branch_name,
                    expected,
                    actual: parent,
                });
            }
        }

        let commit = Commit {
            id: CommitId::new(),
            stream,
            branch: branch_name,
            object_id: input.object_id,
            message: input.message,
            source_application: input.source_application,
            parent,
            created_at: Utc::now(),
        };
        history.push(commit.clone());
        debug!(
            commit = %commit.id.short_id(),
            object = %commit.object_id.short_hex(),
            branch = %commit.branch,
            "created commit"
        );
        Ok(commit)
    }

    fn branches(&self, stream: &StreamId) -> Result<&BTreeMap<String, Vec<Commit>>> {
        self.streams
            .get(stream)
            .ok_or_else(|| RefError::StreamNotFound {
                stream: stream.clone(),
            })
    }

    fn branches_mut(&mut self, stream: &StreamId) -> Result<&mut BTreeMap<String, Vec<Commit>>> {
        self.streams
            .get_mut(stream)
            .ok_or_else(|| RefError::StreamNotFound {
                stream: stream.clone(),
            })
    }

    fn history(&self, stream: &StreamId, branch: &str) -> Result<&[Commit]> {
        self.branches(stream)?
            .get(branch)
            .map(Vec::as_slice)
            .ok_or_else(|| RefError::BranchNotFound {
                stream: stream.clone(),
                branch: branch.to_string(),
            })
    }
}
