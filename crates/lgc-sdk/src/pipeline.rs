//! End-to-end publish of one layer group.
//!
//! A run reads the element's metadata, parses it, resolves every opening
//! and perforator it names in a single deduplicated pass, assembles the root
//! graph, and hands it to the [`CommitPublisher`]. Any failure ends the run
//! with one [`PipelineError`]; nothing is retried.

use lgc_graph::{assemble, Converter, HostLookup, ReferenceResolver};
use lgc_metadata::{parse, MetadataStore, LAYER_GROUP_SCHEMA};
use lgc_types::RefKind;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};

use crate::config::PublishConfig;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::publisher::{CommitPublisher, PublishTarget, Published};

/// Everything a pipeline needs from the host application.
pub trait Host:
    HostLookup + MetadataStore<<Self as HostLookup>::Entity> + Converter<<Self as HostLookup>::Entity>
{
}

impl<T> Host for T where
    T: HostLookup
        + MetadataStore<<T as HostLookup>::Entity>
        + Converter<<T as HostLookup>::Entity>
        + ?Sized
{
}

/// Publishes layer groups to one stream and branch.
#[derive(Clone)]
pub struct Pipeline {
    publisher: CommitPublisher,
    resolver: ReferenceResolver,
    target: PublishTarget,
}

impl Pipeline {
    pub fn new(publisher: CommitPublisher, config: &PublishConfig) -> Self {
        Self {
            publisher,
            resolver: ReferenceResolver::new(config.max_concurrency),
            target: PublishTarget::from(config),
        }
    }

    pub fn target(&self) -> &PublishTarget {
        &self.target
    }

    /// Publish `root` and everything its metadata references.
    ///
    /// `cancel` is honoured until the upload starts. From then on the upload
    /// and commit run to completion, so a created commit is never reported
    /// as a failure.
    pub async fn run<H>(
        &self,
        host: &H,
        root: &H::Entity,
        cancel: &CancellationToken,
    ) -> PipelineResult<Published>
    where
        H: Host + ?Sized,
    {
        let span = info_span!(
            "publish",
            stream = %self.target.stream,
            branch = %self.target.branch
        );
        async move {
            let raw = host
                .read_metadata(root, &LAYER_GROUP_SCHEMA)?
                .ok_or(PipelineError::MetadataAbsent)?;
            let metadata = parse(&raw)?;

            let references = metadata.all_references();
            debug!(references = references.len(), "resolving references");
            let resolution = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(PipelineError::Cancelled { stage: Stage::Resolve });
                }
                resolved = self.resolver.resolve(&references, host, host) => resolved?,
            };

            let graph = assemble(
                root,
                &metadata,
                resolution.nodes(RefKind::Opening),
                resolution.nodes(RefKind::Perforator),
                host,
            )?;

            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled { stage: Stage::Send });
            }
            Ok(self.publisher.publish(graph, &self.target).await?)
        }
        .instrument(span)
        .await
    }

    /// Blocking form of [`run`](Self::run) without cancellation.
    ///
    /// Builds a current-thread runtime for the call, so it must not be used
    /// from inside an async context.
    pub fn run_blocking<H>(&self, host: &H, root: &H::Entity) -> PipelineResult<Published>
    where
        H: Host + ?Sized,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(PipelineError::Runtime)?;
        runtime.block_on(self.run(host, root, &CancellationToken::new()))
    }
}

/// One-shot blocking publish with a fresh pipeline.
pub fn publish_blocking<H>(
    publisher: CommitPublisher,
    config: &PublishConfig,
    host: &H,
    root: &H::Entity,
) -> PipelineResult<Published>
where
    H: Host + ?Sized,
{
    Pipeline::new(publisher, config).run_blocking(host, root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Element, JsonDocument};
    use async_trait::async_trait;
    use lgc_graph::{ConversionError, LookupError, ResolutionError};
    use lgc_graph::read_metadata as metadata_of;
    use lgc_metadata::{MetadataStoreError, StorageSchema};
    use lgc_refs::{CommitService, InMemoryCommitService, RefError};
    use lgc_store::{
        ContentStore, InMemoryObjectStore, ObjectStore, ObjectStoreTransport, TransportError,
        UploadReport,
    };
    use lgc_types::{EntityId, ObjectId, ObjectNode, StreamId};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Wraps a document and counts host calls.
    struct CountingDocument {
        inner: JsonDocument,
        lookups: AtomicUsize,
        conversions: AtomicUsize,
        /// When set, every lookup signals `entered` and waits here.
        hold: Option<Notify>,
        entered: Notify,
    }

    impl CountingDocument {
        fn new(inner: JsonDocument) -> Self {
            Self {
                inner,
                lookups: AtomicUsize::new(0),
                conversions: AtomicUsize::new(0),
                hold: None,
                entered: Notify::new(),
            }
        }

        fn holding_lookups(mut self) -> Self {
            self.hold = Some(Notify::new());
            self
        }
    }

    #[async_trait]
    impl HostLookup for CountingDocument {
        type Entity = Element;

        async fn find(&self, id: &EntityId) -> Result<Option<Element>, LookupError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if let Some(release) = &self.hold {
                self.entered.notify_one();
                release.notified().await;
            }
            self.inner.find(id).await
        }
    }

    impl MetadataStore<Element> for CountingDocument {
        fn read_metadata(
            &self,
            entity: &Element,
            schema: &StorageSchema,
        ) -> Result<Option<String>, MetadataStoreError> {
            self.inner.read_metadata(entity, schema)
        }
    }

    impl Converter<Element> for CountingDocument {
        fn to_object_node(&self, entity: &Element) -> Result<ObjectNode, ConversionError> {
            self.conversions.fetch_add(1, Ordering::SeqCst);
            self.inner.to_object_node(entity)
        }
    }

    /// Commit service that counts create calls.
    struct CountingCommits {
        inner: InMemoryCommitService,
        creates: AtomicUsize,
    }

    #[async_trait]
    impl CommitService for CountingCommits {
        async fn create_stream(&self, stream: &StreamId) -> lgc_refs::Result<()> {
            self.inner.create_stream(stream).await
        }

        async fn create_branch(&self, stream: &StreamId, branch: &str) -> lgc_refs::Result<()> {
            self.inner.create_branch(stream, branch).await
        }

        async fn list_branches(
            &self,
            stream: &StreamId,
        ) -> lgc_refs::Result<Vec<lgc_refs::BranchInfo>> {
            self.inner.list_branches(stream).await
        }

        async fn get_head(
            &self,
            stream: &StreamId,
            branch: &str,
        ) -> lgc_refs::Result<Option<lgc_refs::Commit>> {
            self.inner.get_head(stream, branch).await
        }

        async fn create_commit(
            &self,
            input: lgc_refs::CommitCreateInput,
        ) -> lgc_refs::Result<lgc_refs::Commit> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.inner.create_commit(input).await
        }

        async fn log(
            &self,
            stream: &StreamId,
            branch: &str,
            limit: usize,
        ) -> lgc_refs::Result<Vec<lgc_refs::Commit>> {
            self.inner.log(stream, branch, limit).await
        }
    }

    struct Offline;

    /// Uploads through a real store but cancels `cancel` first.
    struct CancelsDuringUpload {
        inner: ObjectStoreTransport<InMemoryObjectStore>,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl ContentStore for CancelsDuringUpload {
        async fn upload(&self, graph: &ObjectNode) -> Result<UploadReport, TransportError> {
            self.cancel.cancel();
            self.inner.upload(graph).await
        }

        async fn download(&self, id: &ObjectId) -> Result<ObjectNode, TransportError> {
            self.inner.download(id).await
        }
    }

    #[async_trait]
    impl ContentStore for Offline {
        async fn upload(&self, _: &ObjectNode) -> Result<UploadReport, TransportError> {
            Err(TransportError::Unavailable("no route to host".into()))
        }

        async fn download(&self, _: &ObjectId) -> Result<ObjectNode, TransportError> {
            Err(TransportError::Unavailable("no route to host".into()))
        }
    }

    fn element(unique_id: &str, element_id: i64, category: &str) -> Element {
        Element {
            unique_id: unique_id.into(),
            element_id,
            category: category.into(),
            name: None,
            parameters: Default::default(),
            storage: BTreeMap::new(),
        }
    }

    fn layer_group(metadata: &str) -> Element {
        let mut wall = element("lg-wall", 1, "Walls");
        let mut fields = BTreeMap::new();
        fields.insert(
            LAYER_GROUP_SCHEMA.field.to_string(),
            metadata.to_string(),
        );
        wall.storage
            .insert(LAYER_GROUP_SCHEMA.guid.to_string(), fields);
        wall
    }

    fn document(root: Element) -> CountingDocument {
        CountingDocument::new(
            JsonDocument::from_elements(vec![
                root,
                element("A", 10, "Windows"),
                element("B", 11, "Doors"),
                element("P", 12, "Ducts"),
            ])
            .unwrap(),
        )
    }

    fn stream() -> StreamId {
        StreamId::new("proj-1").unwrap()
    }

    struct Harness {
        objects: Arc<InMemoryObjectStore>,
        commits: Arc<CountingCommits>,
        pipeline: Pipeline,
    }

    fn harness_with(content: Option<Arc<dyn ContentStore>>) -> Harness {
        let objects = Arc::new(InMemoryObjectStore::new());
        let commits = Arc::new(CountingCommits {
            inner: InMemoryCommitService::with_stream(&stream()).unwrap(),
            creates: AtomicUsize::new(0),
        });
        let content: Arc<dyn ContentStore> = match content {
            Some(content) => content,
            None => Arc::new(ObjectStoreTransport::new(Arc::clone(&objects))),
        };
        let publisher = CommitPublisher::new(content, commits.clone());
        let pipeline = Pipeline::new(publisher, &PublishConfig::new(stream()));
        Harness {
            objects,
            commits,
            pipeline,
        }
    }

    fn harness() -> Harness {
        harness_with(None)
    }

    fn wrap(perforator_data: &str) -> String {
        format!(r#"{{"SelfGuid":"lg-wall","LayerGroupMetadata":{{"PerforatorData":{perforator_data}}}}}"#)
    }

    async fn run(h: &Harness, doc: &CountingDocument) -> PipelineResult<Published> {
        let root = doc.inner.get(&EntityId::parse("lg-wall").unwrap()).unwrap().clone();
        h.pipeline.run(doc, &root, &CancellationToken::new()).await
    }

    #[tokio::test]
    async fn duplicate_openings_are_resolved_once() {
        let h = harness();
        let doc = document(layer_group(&wrap(r#"{"Openings":["A","A","B"],"Perforators":[]}"#)));

        let published = run(&h, &doc).await.unwrap();

        assert_eq!(doc.lookups.load(Ordering::SeqCst), 2);
        // two references plus the root
        assert_eq!(doc.conversions.load(Ordering::SeqCst), 3);

        let graph = h
            .pipeline
            .publisher
            .content()
            .download(&published.commit.object_id)
            .await
            .unwrap();
        let openings = graph.children("@openings");
        assert_eq!(openings.len(), 3);
        assert!(Arc::ptr_eq(&openings[0], &openings[1]));
        assert!(graph.relationship("@perforators").unwrap().is_empty());
    }

    #[tokio::test]
    async fn identifiers_shared_across_kinds_are_resolved_once() {
        let h = harness();
        let doc = document(layer_group(&wrap(r#"{"Openings":["A",12],"Perforators":["P","A"]}"#)));

        run(&h, &doc).await.unwrap();
        assert_eq!(doc.lookups.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn metadata_round_trips_through_the_store() {
        let h = harness();
        let raw = wrap(r#"{"Openings":["B"],"Perforators":[12]}"#);
        let doc = document(layer_group(&raw));

        let published = run(&h, &doc).await.unwrap();
        let graph = h
            .pipeline
            .publisher
            .content()
            .download(&published.commit.object_id)
            .await
            .unwrap();
        assert_eq!(metadata_of(&graph).unwrap(), parse(&raw).unwrap());
    }

    #[tokio::test]
    async fn empty_collections_still_publish_both_relationships() {
        let h = harness();
        let doc = document(layer_group(&wrap("{}")));

        let published = run(&h, &doc).await.unwrap();
        assert_eq!(doc.lookups.load(Ordering::SeqCst), 0);

        let graph = h
            .pipeline
            .publisher
            .content()
            .download(&published.commit.object_id)
            .await
            .unwrap();
        for key in ["@openings", "@perforators"] {
            assert!(graph.relationship(key).is_some_and(|r| r.is_empty()));
        }
    }

    #[tokio::test]
    async fn dangling_opening_makes_no_commit_call() {
        let h = harness();
        let doc = document(layer_group(&wrap(r#"{"Openings":["A","ghost"]}"#)));

        let err = run(&h, &doc).await.unwrap_err();
        assert!(matches!(
            &err,
            PipelineError::Resolution(ResolutionError::UnresolvedReference { id, kind: RefKind::Opening })
                if *id == EntityId::UniqueId("ghost".into())
        ));
        assert_eq!(err.stage(), Stage::Resolve);
        assert_eq!(h.commits.creates.load(Ordering::SeqCst), 0);
        assert!(h.objects.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_leaves_head_unchanged() {
        let h = harness_with(Some(Arc::new(Offline)));
        let doc = document(layer_group(&wrap(r#"{"Openings":["A"]}"#)));

        let err = run(&h, &doc).await.unwrap_err();
        assert_eq!(err.stage(), Stage::Send);
        assert_eq!(h.commits.creates.load(Ordering::SeqCst), 0);
        assert!(h.commits.get_head(&stream(), "main").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn identical_publishes_share_content_and_add_one_commit_each() {
        let h = harness();
        let doc = document(layer_group(&wrap(r#"{"Openings":["A"],"Perforators":["P"]}"#)));

        let first = run(&h, &doc).await.unwrap();
        let stored = h.objects.len();
        let second = run(&h, &doc).await.unwrap();

        assert_eq!(first.commit.object_id, second.commit.object_id);
        assert_eq!(second.upload.written, 0);
        assert_eq!(h.objects.len(), stored);
        assert_eq!(h.commits.creates.load(Ordering::SeqCst), 2);
        assert_eq!(second.commit.parent, Some(first.commit.id));
    }

    #[tokio::test]
    async fn stale_expected_head_is_reported_as_commit_failure() {
        let h = harness();
        let doc = document(layer_group(&wrap(r#"{"Openings":["A"]}"#)));
        let first = run(&h, &doc).await.unwrap();
        run(&h, &doc).await.unwrap();

        let config = PublishConfig::new(stream()).with_expected_head(first.commit.id);
        let guarded = Pipeline::new(h.pipeline.publisher.clone(), &config);
        let root = doc.inner.get(&EntityId::ElementId(1)).unwrap().clone();
        let err = guarded
            .run(&doc, &root, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Commit);
        assert!(matches!(
            err,
            PipelineError::Publish(crate::PublishError::CommitFailure {
                source: RefError::Conflict { .. },
                ..
            })
        ));
        assert_eq!(h.commits.log(&stream(), "main", 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_and_malformed_metadata() {
        let h = harness();

        let doc = document(element("lg-wall", 1, "Walls"));
        let err = run(&h, &doc).await.unwrap_err();
        assert!(matches!(err, PipelineError::MetadataAbsent));
        assert_eq!(err.stage(), Stage::ReadMetadata);

        let doc = document(layer_group("{broken"));
        let err = run(&h, &doc).await.unwrap_err();
        assert_eq!(err.stage(), Stage::Parse);

        let doc = document(layer_group(r#"{"LayerGroupMetadata":{}}"#));
        assert!(matches!(
            run(&h, &doc).await,
            Err(PipelineError::Parse(_))
        ));
        assert_eq!(h.commits.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_before_upload_stops_the_run() {
        let h = harness();
        let doc = document(layer_group(&wrap(r#"{"Openings":["A"]}"#)));
        let root = doc.inner.get(&EntityId::ElementId(1)).unwrap().clone();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = h.pipeline.run(&doc, &root, &cancel).await.unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled { stage: Stage::Resolve }));
        assert_eq!(h.commits.creates.load(Ordering::SeqCst), 0);
        assert!(h.objects.is_empty());
    }

    #[tokio::test]
    async fn cancellation_during_lookup_stops_before_upload() {
        let h = harness();
        let doc = document(layer_group(&wrap(r#"{"Openings":["A","B"]}"#))).holding_lookups();
        let root = doc.inner.get(&EntityId::ElementId(1)).unwrap().clone();
        let cancel = CancellationToken::new();

        let cancel_once_resolving = async {
            doc.entered.notified().await;
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(
            h.pipeline.run(&doc, &root, &cancel),
            cancel_once_resolving
        );

        assert!(matches!(
            result,
            Err(PipelineError::Cancelled { stage: Stage::Resolve })
        ));
        assert!(doc.lookups.load(Ordering::SeqCst) >= 1);
        assert_eq!(doc.conversions.load(Ordering::SeqCst), 0);
        assert!(h.objects.is_empty());
        assert_eq!(h.commits.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_after_sending_starts_still_commits() {
        let cancel = CancellationToken::new();
        let h = harness_with(Some(Arc::new(CancelsDuringUpload {
            inner: ObjectStoreTransport::new(Arc::new(InMemoryObjectStore::new())),
            cancel: cancel.clone(),
        })));
        let doc = document(layer_group(&wrap(r#"{"Openings":["A"]}"#)));
        let root = doc.inner.get(&EntityId::ElementId(1)).unwrap().clone();

        let published = h.pipeline.run(&doc, &root, &cancel).await.unwrap();

        assert!(cancel.is_cancelled());
        assert_eq!(h.commits.creates.load(Ordering::SeqCst), 1);
        let head = h.commits.get_head(&stream(), "main").await.unwrap();
        assert_eq!(head, Some(published.commit));
    }

    #[test]
    fn blocking_entry_point_publishes() {
        let h = harness();
        let doc = document(layer_group(&wrap(r#"{"Openings":["A"]}"#)));
        let root = doc.inner.get(&EntityId::ElementId(1)).unwrap().clone();

        let published = publish_blocking(
            h.pipeline.publisher.clone(),
            &PublishConfig::new(stream()).with_message("from a blocking caller"),
            &doc,
            &root,
        )
        .unwrap();

        assert_eq!(published.commit.message, "from a blocking caller");
        assert!(h.objects.exists(&published.commit.object_id).unwrap());
    }
}
