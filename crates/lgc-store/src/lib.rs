//! Content-addressed object storage for layer group graphs.
//!
//! An [`ObjectNode`](lgc_types::ObjectNode) graph is stored as a set of
//! immutable objects keyed by the domain-separated BLAKE3 hash of their
//! serialized form. Every child reached through an `@`-prefixed relationship
//! is detached into its own object; the parent holds only its hash. A child
//! shared by many parents (or named twice by one) is stored once.
//!
//! # Layers
//!
//! - [`ObjectStore`]: synchronous key-value store of [`StoredObject`]s, with
//!   [`InMemoryObjectStore`] and [`FileObjectStore`] backends.
//! - [`codec`]: decomposes a graph into objects ([`encode_graph`]) and
//!   rebuilds it ([`decode_graph`]).
//! - [`ContentStore`]: the async upload/download surface the publisher
//!   talks to, implemented over any object store by
//!   [`ObjectStoreTransport`].
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written.
//! 2. Writing an object that already exists is a no-op.
//! 3. Children are written before the parents that reference them.
//! 4. Reads verify the content hash.

pub mod codec;
pub mod error;
pub mod file;
pub mod memory;
pub mod object;
pub mod traits;
pub mod transport;

pub use codec::{decode_graph, encode_graph, EncodedGraph};
pub use error::{StoreError, StoreResult, TransportError};
pub use file::FileObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::StoredObject;
pub use traits::ObjectStore;
pub use transport::{ContentStore, ObjectStoreTransport, UploadReport};
