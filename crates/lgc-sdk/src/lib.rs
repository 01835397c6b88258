//! High-level SDK for layer group commits.
//!
//! Reads a layer group's metadata from the host, resolves the openings and
//! perforators it names into shared object nodes, assembles one root graph,
//! uploads it to a content store and records a commit for it. This is the
//! main entry point for host integrations and the `lgc` CLI.
//!
//! ```ignore
//! let publisher = CommitPublisher::new(content, commits);
//! let pipeline = Pipeline::new(publisher, &PublishConfig::load(path)?);
//! let published = pipeline.run(&document, &element, &cancel).await?;
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod publisher;
pub mod receive;

pub use config::{PublishConfig, DEFAULT_MESSAGE, DEFAULT_SOURCE_TAG};
pub use document::{DocumentError, Element, JsonDocument};
pub use error::{
    ConfigError, PipelineError, PipelineResult, PublishError, ReceiveError, Stage,
};
pub use pipeline::{publish_blocking, Host, Pipeline};
pub use publisher::{CommitPublisher, PublishState, PublishTarget, Published};
pub use receive::{Received, Receiver};

// Re-export key types
pub use lgc_graph::{Converter, HostLookup};
pub use lgc_metadata::{LayerGroupMetadata, MetadataStore, LAYER_GROUP_SCHEMA};
pub use lgc_refs::{Commit, CommitService, FileCommitService, InMemoryCommitService};
pub use lgc_store::{
    ContentStore, FileObjectStore, InMemoryObjectStore, ObjectStoreTransport, UploadReport,
};
pub use lgc_types::{CommitId, EntityId, ObjectId, ObjectNode, StreamId};
pub use tokio_util::sync::CancellationToken;
