//! Extensible-storage schema and the host-side read interface.

use uuid::Uuid;

use crate::error::MetadataStoreError;

/// Identifies a string field inside a host extensible-storage schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageSchema {
    pub guid: Uuid,
    pub field: &'static str,
}

/// The schema under which layer group elements keep their JSON metadata.
pub const LAYER_GROUP_SCHEMA: StorageSchema = StorageSchema {
    guid: Uuid::from_u128(0xd2076246_c30b_414b_b7be_071151d82a39),
    field: "JSONData",
};

/// Reads the raw metadata string stored on a host entity.
///
/// Returns `Ok(None)` when the entity has no value in the slot. The store is
/// read-only from this crate's point of view.
pub trait MetadataStore<E>: Send + Sync {
    fn read_metadata(
        &self,
        entity: &E,
        schema: &StorageSchema,
    ) -> Result<Option<String>, MetadataStoreError>;
}
