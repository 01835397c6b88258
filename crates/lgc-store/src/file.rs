use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use lgc_types::ObjectId;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Loose-object store on the local filesystem.
///
/// Objects live at `<root>/<first two hex chars>/<remaining hex>`. Writes go
/// to a temporary file in the root and are renamed into place, so readers
/// never observe a partially written object.
#[derive(Clone, Debug)]
pub struct FileObjectStore {
    root: PathBuf,
}

impl FileObjectStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        let (dir, file) = hex.split_at(2);
        self.root.join(dir).join(file)
    }
}

impl ObjectStore for FileObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let data = match fs::read(self.object_path(id)) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let object = StoredObject::new(data);
        if let Err(e) = object.verify(id) {
            warn!(id = %id.short_hex(), error = %e, "object failed hash check");
            return Err(e);
        }
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let path = self.object_path(&id);
        if path.exists() {
            return Ok(id);
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&object.data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(id = %id.short_hex(), size = object.size, "wrote loose object");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        match fs::remove_file(self.object_path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, FileObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileObjectStore::open(dir.path().join("objects")).unwrap();
        (dir, store)
    }

    #[test]
    fn write_read_roundtrip() {
        let (_dir, store) = temp_store();
        let obj = StoredObject::new(br#"{"kind":"Opening"}"#.to_vec());
        let id = store.write(&obj).unwrap();

        assert!(store.exists(&id).unwrap());
        assert_eq!(store.read(&id).unwrap(), Some(obj));

        let hex = id.to_hex();
        assert!(store.root().join(&hex[..2]).join(&hex[2..]).is_file());
    }

    #[test]
    fn survives_reopen() {
        let (dir, store) = temp_store();
        let id = store.write(&StoredObject::new(b"durable".to_vec())).unwrap();
        drop(store);

        let reopened = FileObjectStore::open(dir.path().join("objects")).unwrap();
        assert!(reopened.read(&id).unwrap().is_some());
    }

    #[test]
    fn second_write_is_noop() {
        let (_dir, store) = temp_store();
        let obj = StoredObject::new(b"twice".to_vec());
        assert_eq!(store.write(&obj).unwrap(), store.write(&obj).unwrap());
    }

    #[test]
    fn corrupted_object_is_detected() {
        let (_dir, store) = temp_store();
        let id = store.write(&StoredObject::new(b"original".to_vec())).unwrap();
        fs::write(store.object_path(&id), b"tampered").unwrap();

        assert!(matches!(
            store.read(&id),
            Err(StoreError::HashMismatch { .. })
        ));
    }

    #[test]
    fn missing_and_delete() {
        let (_dir, store) = temp_store();
        let id = store.write(&StoredObject::new(b"x".to_vec())).unwrap();
        assert!(store.delete(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
        assert_eq!(store.read(&id).unwrap(), None);
    }
}
