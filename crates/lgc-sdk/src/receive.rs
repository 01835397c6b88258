//! Reading published layer groups back.

use std::sync::Arc;

use lgc_metadata::{LayerGroupMetadata, ParseError};
use lgc_refs::{Commit, CommitService};
use lgc_store::ContentStore;
use lgc_types::{ObjectNode, StreamId};
use tracing::debug;

use crate::error::ReceiveError;

/// A branch head together with the graph it points at.
#[derive(Clone, Debug)]
pub struct Received {
    pub commit: Commit,
    pub root: ObjectNode,
}

impl Received {
    /// Metadata carried on the received root.
    pub fn metadata(&self) -> Result<LayerGroupMetadata, ParseError> {
        lgc_graph::read_metadata(&self.root)
    }
}

/// Fetches the graph at a branch head.
#[derive(Clone)]
pub struct Receiver {
    content: Arc<dyn ContentStore>,
    commits: Arc<dyn CommitService>,
}

impl Receiver {
    pub fn new(content: Arc<dyn ContentStore>, commits: Arc<dyn CommitService>) -> Self {
        Self { content, commits }
    }

    /// `Ok(None)` when the branch exists but has no commits yet.
    pub async fn receive(
        &self,
        stream: &StreamId,
        branch: &str,
    ) -> Result<Option<Received>, ReceiveError> {
        let Some(commit) = self.commits.get_head(stream, branch).await? else {
            return Ok(None);
        };
        let root = self.content.download(&commit.object_id).await?;
        debug!(
            commit = %commit.id.short_id(),
            object = %commit.object_id.short_hex(),
            "received layer group"
        );
        Ok(Some(Received { commit, root }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PublishConfig;
    use crate::publisher::{CommitPublisher, PublishTarget};
    use lgc_refs::{InMemoryCommitService, RefError};
    use lgc_store::{InMemoryObjectStore, ObjectStore, ObjectStoreTransport, TransportError};
    use lgc_types::{EntityId, Relationship};

    fn stream() -> StreamId {
        StreamId::new("proj").unwrap()
    }

    fn services() -> (
        Arc<InMemoryObjectStore>,
        Arc<dyn ContentStore>,
        Arc<dyn CommitService>,
    ) {
        let objects = Arc::new(InMemoryObjectStore::new());
        let content: Arc<dyn ContentStore> =
            Arc::new(ObjectStoreTransport::new(Arc::clone(&objects)));
        let commits: Arc<dyn CommitService> =
            Arc::new(InMemoryCommitService::with_stream(&stream()).unwrap());
        (objects, content, commits)
    }

    fn layer_group() -> ObjectNode {
        let metadata = LayerGroupMetadata::new(vec![EntityId::ElementId(7)], Vec::new());
        let mut root = ObjectNode::new("Walls").with_property(
            lgc_graph::METADATA_PROPERTY,
            lgc_metadata::serialize(&metadata).unwrap(),
        );
        root.set_relationship(
            "@openings",
            Relationship::Many(vec![ObjectNode::new("Windows").into_shared()]),
        );
        root.set_relationship("@perforators", Relationship::Many(Vec::new()));
        root
    }

    #[tokio::test]
    async fn receives_the_latest_publish() {
        let (_, content, commits) = services();
        let publisher = CommitPublisher::new(Arc::clone(&content), Arc::clone(&commits));
        let target = PublishTarget::from(&PublishConfig::new(stream()));
        let published = publisher.publish(layer_group(), &target).await.unwrap();

        let received = Receiver::new(content, commits)
            .receive(&stream(), "main")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(received.commit, published.commit);
        assert_eq!(received.root, layer_group());
        assert_eq!(
            received.metadata().unwrap().perforator_data().openings,
            vec![EntityId::ElementId(7)]
        );
    }

    #[tokio::test]
    async fn empty_branch_yields_nothing() {
        let (_, content, commits) = services();
        let receiver = Receiver::new(content, commits);
        assert!(receiver.receive(&stream(), "main").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_branch_is_a_ref_error() {
        let (_, content, commits) = services();
        let err = Receiver::new(content, commits)
            .receive(&stream(), "nope")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReceiveError::Ref(RefError::BranchNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn missing_content_is_a_transport_error() {
        let (objects, content, commits) = services();
        let publisher = CommitPublisher::new(Arc::clone(&content), Arc::clone(&commits));
        let target = PublishTarget::from(&PublishConfig::new(stream()));
        let published = publisher.publish(layer_group(), &target).await.unwrap();
        objects.delete(&published.commit.object_id).unwrap();

        let err = Receiver::new(content, commits)
            .receive(&stream(), "main")
            .await
            .unwrap_err();
        assert!(matches!(err, ReceiveError::Transport(TransportError::Store(_))));
    }
}
