//! In-memory object store.
//!
//! Reference implementation of [`ObjectStore`] for tests and embedders
//! that do not need durable persistence. Clones share state via `Arc`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use petrel_proto::{Guid, ObjectKind};

use super::{ObjectRecord, ObjectStore, StoreError};

type Records = HashMap<(ObjectKind, Guid), ObjectRecord>;

/// In-memory [`ObjectStore`] backed by a shared hash map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Records>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Records>, StoreError> {
        self.records.lock().map_err(|_| StoreError::Io("store lock poisoned".to_string()))
    }
}

impl ObjectStore for MemoryStore {
    fn find(&self, kind: ObjectKind, guid: &Guid) -> Result<Option<ObjectRecord>, StoreError> {
        Ok(self.lock()?.get(&(kind, guid.clone())).cloned())
    }

    fn insert(&self, record: ObjectRecord) -> Result<(), StoreError> {
        self.lock()?.insert((record.kind, record.guid.clone()), record);
        Ok(())
    }

    fn delete(&self, kind: ObjectKind, guid: &Guid) -> Result<bool, StoreError> {
        Ok(self.lock()?.remove(&(kind, guid.clone())).is_some())
    }
}
