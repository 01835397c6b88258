//! Capabilities the host document provides.

use async_trait::async_trait;
use lgc_types::{EntityId, ObjectNode};

use crate::error::{ConversionError, LookupError};

/// Finds entities in the host document by identifier.
///
/// Identifiers are opaque: the lookup decides how to interpret unique ids
/// and element ids. `Ok(None)` means the entity does not exist. The lookup
/// must not mutate the document.
#[async_trait]
pub trait HostLookup: Send + Sync {
    type Entity: Send + Sync;

    async fn find(&self, id: &EntityId) -> Result<Option<Self::Entity>, LookupError>;
}

/// Maps a host entity to a generic object node.
///
/// Must be deterministic for a given entity state, and must not assign
/// content hashes.
pub trait Converter<E>: Send + Sync {
    fn to_object_node(&self, entity: &E) -> Result<ObjectNode, ConversionError>;
}
