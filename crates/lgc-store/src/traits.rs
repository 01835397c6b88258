use lgc_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;

/// Content-addressed object store.
///
/// Implementations must keep these invariants:
/// - Objects are immutable once written; the same data always yields the
///   same ID.
/// - Writing an object that is already present is a no-op.
/// - Concurrent reads are always safe.
/// - All I/O errors are propagated.
pub trait ObjectStore: Send + Sync {
    /// Read an object by ID. `Ok(None)` if it does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its ID.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Delete an object by ID. Returns `true` if the object existed.
    ///
    /// Deleting an object that a stored parent references leaves that
    /// parent undecodable.
    fn delete(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Read an object that must exist.
    fn read_required(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.read(id)?.ok_or(crate::StoreError::NotFound(*id))
    }
}
