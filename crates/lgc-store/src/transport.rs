use std::sync::Arc;

use async_trait::async_trait;
use lgc_types::{ObjectId, ObjectNode};
use tracing::debug;

use crate::codec::{decode_graph, encode_graph, EncodedGraph};
use crate::error::{StoreResult, TransportError};
use crate::traits::ObjectStore;

/// Outcome of uploading one graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadReport {
    /// Content hash of the root object.
    pub root: ObjectId,
    /// Objects newly written.
    pub written: usize,
    /// Objects already present and left untouched.
    pub skipped: usize,
}

/// Remote side of a publish: content-addressed, dedup-aware storage for
/// object graphs.
///
/// Uploading the same graph twice yields the same root hash and writes
/// nothing the second time.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn upload(&self, graph: &ObjectNode) -> Result<UploadReport, TransportError>;

    /// Fetch and rebuild the graph rooted at `id`.
    async fn download(&self, id: &ObjectId) -> Result<ObjectNode, TransportError>;
}

/// [`ContentStore`] over any [`ObjectStore`].
///
/// Store calls are synchronous and may touch the filesystem, so they run on
/// tokio's blocking pool.
pub struct ObjectStoreTransport<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ObjectStore + ?Sized + 'static> ObjectStoreTransport<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[async_trait]
impl<S: ObjectStore + ?Sized + 'static> ContentStore for ObjectStoreTransport<S> {
    async fn upload(&self, graph: &ObjectNode) -> Result<UploadReport, TransportError> {
        let encoded = encode_graph(graph)?;
        let store = Arc::clone(&self.store);
        let report = tokio::task::spawn_blocking(move || write_missing(&*store, encoded))
            .await
            .map_err(|e| TransportError::Interrupted(e.to_string()))??;

        debug!(
            root = %report.root.short_hex(),
            written = report.written,
            skipped = report.skipped,
            "uploaded object graph"
        );
        Ok(report)
    }

    async fn download(&self, id: &ObjectId) -> Result<ObjectNode, TransportError> {
        let store = Arc::clone(&self.store);
        let id = *id;
        let node = tokio::task::spawn_blocking(move || decode_graph(&id, &*store))
            .await
            .map_err(|e| TransportError::Interrupted(e.to_string()))??;
        Ok(node)
    }
}

/// Write every object the store does not already hold, children first.
fn write_missing<S: ObjectStore + ?Sized>(
    store: &S,
    encoded: EncodedGraph,
) -> StoreResult<UploadReport> {
    let mut written = 0;
    let mut skipped = 0;
    for (id, object) in &encoded.objects {
        if store.exists(id)? {
            skipped += 1;
        } else {
            store.write(object)?;
            written += 1;
        }
    }
    Ok(UploadReport {
        root: encoded.root,
        written,
        skipped,
    })
}
