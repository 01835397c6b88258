use lgc_crypto::ContentHasher;
use lgc_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// A stored object: serialized node bytes plus cached size.
///
/// The store never interprets `data`; the codec does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub size: u64,
}

impl StoredObject {
    pub fn new(data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { data, size }
    }

    /// The content-addressed ID of this object.
    pub fn compute_id(&self) -> ObjectId {
        ContentHasher::NODE.hash(&self.data)
    }

    /// Check that `data` still hashes to `id`.
    pub fn verify(&self, id: &ObjectId) -> StoreResult<()> {
        if ContentHasher::NODE.verify(&self.data, id) {
            Ok(())
        } else {
            Err(StoreError::HashMismatch {
                id: *id,
                computed: self.compute_id(),
            })
        }
    }
}
