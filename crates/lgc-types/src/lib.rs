//! Foundation types for layer group commits (LGC).
//!
//! This crate provides the identity and structural types shared by every
//! other LGC crate: content hashes, host entity identifiers, stream and
//! commit identifiers, and the generic [`ObjectNode`] graph that is
//! assembled from a host document and published to a store.
//!
//! # Key Types
//!
//! - [`ObjectId`] — Content-addressed identifier (BLAKE3 hash)
//! - [`EntityId`] — Opaque host entity identifier (unique id or element id)
//! - [`EntityRef`] — An entity identifier plus its relationship kind
//! - [`StreamId`] / [`CommitId`] — Store-side identifiers
//! - [`ObjectNode`] — Generic object with properties and relationships

pub mod entity;
pub mod error;
pub mod node;
pub mod object;
pub mod stream;

pub use entity::{EntityId, EntityRef, RefKind};
pub use error::TypeError;
pub use node::{is_detachable_key, NodeRef, ObjectNode, Relationship, Value, DETACHED_PREFIX};
pub use object::ObjectId;
pub use stream::{CommitId, StreamId};
