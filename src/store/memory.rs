use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::StorageError;

use super::{Entries, KeyValueStore, select};

/// In-memory store. Clones share the same data, the way every context of
/// an extension sees one storage area.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<Entries>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Entries) -> Self {
        Self {
            data: Arc::new(Mutex::new(entries)),
        }
    }

    /// Copy of the whole store, for inspection.
    pub fn snapshot(&self) -> Entries {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Entries, StorageError> {
        Ok(select(&self.lock(), keys))
    }

    async fn set(&self, entries: Entries) -> Result<(), StorageError> {
        self.lock().extend(entries);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut data = self.lock();
        for key in keys {
            data.remove(*key);
        }
        Ok(())
    }

    async fn get_all(&self) -> Result<Entries, StorageError> {
        Ok(self.snapshot())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.lock().clear();
        Ok(())
    }
}
