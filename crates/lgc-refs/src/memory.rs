//! In-memory commit service for tests and embedding.

use std::sync::RwLock;

use async_trait::async_trait;
use lgc_types::StreamId;

use crate::error::Result;
use crate::state::Namespace;
use crate::traits::CommitService;
use crate::types::{BranchInfo, Commit, CommitCreateInput};

/// A [`CommitService`] whose history lives in memory and is lost on drop.
///
/// Commit creation takes the write lock for the whole check-and-append, so
/// concurrent commits on one branch are serialized.
#[derive(Debug, Default)]
pub struct InMemoryCommitService {
    state: RwLock<Namespace>,
}

impl InMemoryCommitService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service that already holds `stream` with its default branch.
    pub fn with_stream(stream: &StreamId) -> Result<Self> {
        let service = Self::new();
        service.state.write().expect("lock poisoned").create_stream(stream)?;
        Ok(service)
    }
}

#[async_trait]
impl CommitService for InMemoryCommitService {
    async fn create_stream(&self, stream: &StreamId) -> Result<()> {
        self.state.write().expect("lock poisoned").create_stream(stream)
    }

    async fn create_branch(&self, stream: &StreamId, branch: &str) -> Result<()> {
        self.state
            .write()
            .expect("lock poisoned")
            .create_branch(stream, branch)
    }

    async fn list_branches(&self, stream: &StreamId) -> Result<Vec<BranchInfo>> {
        self.state.read().expect("lock poisoned").list_branches(stream)
    }

    async fn get_head(&self, stream: &StreamId, branch: &str) -> Result<Option<Commit>> {
        self.state.read().expect("lock poisoned").head(stream, branch)
    }

    async fn create_commit(&self, input: CommitCreateInput) -> Result<Commit> {
        self.state.write().expect("lock poisoned").commit(input)
    }

    async fn log(&self, stream: &StreamId, branch: &str, limit: usize) -> Result<Vec<Commit>> {
        self.state
            .read()
            .expect("lock poisoned")
            .log(stream, branch, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RefError;
    use crate::names::DEFAULT_BRANCH;
    use lgc_types::ObjectId;
    use std::sync::Arc;

    fn stream() -> StreamId {
        StreamId::new("a1b2c3").unwrap()
    }

    fn input(branch: &str, content: &[u8]) -> CommitCreateInput {
        CommitCreateInput::new(
            stream(),
            branch,
            ObjectId::from_bytes(content),
            "Commit created with lgc",
            "lgc",
        )
    }

    #[tokio::test]
    async fn new_stream_has_an_empty_main_branch() {
        let service = InMemoryCommitService::with_stream(&stream()).unwrap();
        let branches = service.list_branches(&stream()).await.unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, DEFAULT_BRANCH);
        assert_eq!(branches[0].head, None);
        assert!(service.get_head(&stream(), "main").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commits_advance_the_head() {
        let service = InMemoryCommitService::with_stream(&stream()).unwrap();
        let first = service.create_commit(input("main", b"one")).await.unwrap();
        let second = service.create_commit(input("main", b"two")).await.unwrap();

        assert_eq!(first.parent, None);
        assert_eq!(second.parent, Some(first.id));
        assert_eq!(first.source_application, "lgc");

        let head = service.get_head(&stream(), "main").await.unwrap().unwrap();
        assert_eq!(head, second);

        let log = service.log(&stream(), "main", 10).await.unwrap();
        assert_eq!(log, vec![second.clone(), first]);
        assert_eq!(service.log(&stream(), "main", 1).await.unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn commit_requires_an_existing_branch() {
        let service = InMemoryCommitService::with_stream(&stream()).unwrap();
        let err = service.create_commit(input("missing", b"x")).await.unwrap_err();
        assert!(matches!(err, RefError::BranchNotFound { .. }));

        let other = StreamId::new("elsewhere").unwrap();
        let err = service
            .create_commit(CommitCreateInput {
                stream: other,
                ..input("main", b"x")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RefError::StreamNotFound { .. }));
    }

    #[tokio::test]
    async fn branch_management() {
        let service = InMemoryCommitService::new();
        service.create_stream(&stream()).await.unwrap();
        assert!(matches!(
            service.create_stream(&stream()).await,
            Err(RefError::StreamExists { .. })
        ));

        service.create_branch(&stream(), "design/level-2").await.unwrap();
        assert!(matches!(
            service.create_branch(&stream(), "design/level-2").await,
            Err(RefError::BranchExists { .. })
        ));
        assert!(matches!(
            service.create_branch(&stream(), "bad..name").await,
            Err(RefError::InvalidBranchName { .. })
        ));

        service.create_commit(input("design/level-2", b"x")).await.unwrap();
        let branches = service.list_branches(&stream()).await.unwrap();
        let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["design/level-2", "main"]);
        assert_eq!(branches[0].commit_count, 1);
    }

    #[tokio::test]
    async fn stale_expected_head_is_a_conflict() {
        let service = InMemoryCommitService::with_stream(&stream()).unwrap();
        let observed = service.get_head(&stream(), "main").await.unwrap().map(|c| c.id);

        service.create_commit(input("main", b"winner")).await.unwrap();
        let err = service
            .create_commit(input("main", b"loser").expecting_head(observed))
            .await
            .unwrap_err();

        assert!(matches!(err, RefError::Conflict { expected: None, actual: Some(_), .. }));
        assert_eq!(service.log(&stream(), "main", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_guarded_commits_have_one_winner() {
        let service = Arc::new(InMemoryCommitService::with_stream(&stream()).unwrap());
        let tasks: Vec<_> = (0..8u8)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .create_commit(input("main", &[i]).expecting_head(None))
                        .await
                })
            })
            .collect();

        let mut winners = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => winners += 1,
                Err(e) => assert!(matches!(e, RefError::Conflict { .. })),
            }
        }
        assert_eq!(winners, 1);
    }
}
