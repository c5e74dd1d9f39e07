//! The external key-value store shared by every context.
//!
//! Modelled on a browser extension's local storage area: values are JSON,
//! reads and writes address several keys at once, and there are no
//! transactions. A read followed by a write is two separate operations,
//! so concurrent writers race and the last write wins.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde_json::{Map, Value};

use crate::error::StorageError;

/// A set of key/value pairs as read from or written to the store.
pub type Entries = Map<String, Value>;

/// Persisted key layout.
pub mod keys {
    /// id -> document record
    pub const RECORDS: &str = "library.records";
    pub const CURRENT_ID: &str = "library.currentId";
    pub const SESSION_ACTIVE: &str = "session.active";

    /// Single-document layout predating the library.
    pub const LEGACY_FLAT_TEXT: &str = "legacy.flatText";
    pub const LEGACY_PAGE_INDEX: &str = "legacy.pageIndex";
}

/// Asynchronous, non-transactional JSON key-value store.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Fetch the given keys; absent keys are simply missing from the result.
    async fn get(&self, keys: &[&str]) -> Result<Entries, StorageError>;

    /// Write every entry, replacing existing values.
    async fn set(&self, entries: Entries) -> Result<(), StorageError>;

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError>;

    async fn get_all(&self) -> Result<Entries, StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;

    /// Size of the serialized store contents in bytes.
    async fn bytes_in_use(&self) -> Result<usize, StorageError> {
        let all = self.get_all().await?;
        Ok(serde_json::to_string(&all)?.len())
    }
}

fn select(all: &Entries, keys: &[&str]) -> Entries {
    keys.iter()
        .filter_map(|key| all.get(*key).map(|v| ((*key).to_string(), v.clone())))
        .collect()
}
