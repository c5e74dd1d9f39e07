//! Library store: the persisted multi-document library.
//!
//! Every operation is a read-modify-write against the shared
//! [`KeyValueStore`]. Nothing here is atomic across contexts: two contexts
//! mutating the library at the same time race, and whichever writes last
//! wins.

mod record;

pub use record::{DocumentRecord, Library};
pub(crate) use record::progress_percent;

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::paging;
use crate::store::{Entries, KeyValueStore, keys};
use crate::util::{new_document_id, now, title_from_content};

/// Title given to the document recovered from the legacy layout.
pub const LEGACY_TITLE: &str = "Imported book";

#[derive(Debug, Clone)]
pub struct LibraryStore<S> {
    store: S,
}

impl<S: KeyValueStore> LibraryStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a record for `text`, insert it and make it current.
    ///
    /// Without a title the first short line of the text is used.
    pub async fn import_document(
        &self,
        text: &str,
        title: Option<&str>,
        page_size: usize,
    ) -> Result<DocumentRecord, StorageError> {
        let record = DocumentRecord {
            id: new_document_id(),
            title: title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map_or_else(|| title_from_content(text), str::to_string),
            full_text: text.to_string(),
            current_page_index: 0,
            total_pages: paging::total_pages(text, page_size),
            imported_at: now(),
        };

        let mut library = self.list_documents().await?;
        library.records.insert(record.id.clone(), record.clone());
        library.current_id = Some(record.id.clone());
        self.save(&library).await?;

        info!(id = %record.id, title = %record.title, pages = record.total_pages, "imported document");
        Ok(record)
    }

    /// All records and the current id.
    pub async fn list_documents(&self) -> Result<Library, StorageError> {
        let entries = self.store.get(&[keys::RECORDS, keys::CURRENT_ID]).await?;
        let records = match entries.get(keys::RECORDS) {
            Some(value) => serde_json::from_value(value.clone())?,
            None => Default::default(),
        };
        let current_id = entries
            .get(keys::CURRENT_ID)
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Library { records, current_id })
    }

    pub async fn current_document(&self) -> Result<Option<DocumentRecord>, StorageError> {
        Ok(self.list_documents().await?.current().cloned())
    }

    /// Point the library at an existing record.
    pub async fn switch_current(&self, id: &str) -> Result<DocumentRecord, StorageError> {
        let library = self.list_documents().await?;
        let record = library
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        self.store
            .set(entries([(keys::CURRENT_ID, json!(id))]))
            .await?;
        debug!(id, "switched current document");
        Ok(record)
    }

    /// Remove a record. Deleting the current record moves the pointer to an
    /// arbitrary remaining record, or clears it. Returns the new current id.
    pub async fn delete_document(&self, id: &str) -> Result<Option<String>, StorageError> {
        let mut library = self.list_documents().await?;
        if library.records.remove(id).is_none() {
            return Err(StorageError::NotFound(id.to_string()));
        }

        if library.current_id.as_deref() == Some(id) {
            library.current_id = library.records.keys().next().cloned();
        }
        self.save(&library).await?;

        info!(id, new_current = ?library.current_id, "deleted document");
        Ok(library.current_id)
    }

    /// Persist the reading position of one record.
    ///
    /// The cached page count is recomputed for `page_size` in the same
    /// write, and the index is clamped into it. Returns the stored index.
    pub async fn update_current_page(
        &self,
        id: &str,
        index: usize,
        page_size: usize,
    ) -> Result<usize, StorageError> {
        let mut library = self.list_documents().await?;
        let record = library
            .records
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        record.total_pages = paging::total_pages(&record.full_text, page_size);
        record.current_page_index = paging::clamp_index(index, record.total_pages);
        let stored = record.current_page_index;

        self.store
            .set(entries([(keys::RECORDS, serde_json::to_value(&library.records)?)]))
            .await?;
        Ok(stored)
    }

    pub async fn session_active(&self) -> Result<bool, StorageError> {
        let entries = self.store.get(&[keys::SESSION_ACTIVE]).await?;
        Ok(entries
            .get(keys::SESSION_ACTIVE)
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    pub async fn set_session_active(&self, active: bool) -> Result<(), StorageError> {
        self.store
            .set(entries([(keys::SESSION_ACTIVE, json!(active))]))
            .await
    }

    /// One-time upgrade from the single-document layout.
    ///
    /// When the legacy text blob is present it becomes a new current record
    /// (keeping the legacy page index) and the legacy keys are removed, so a
    /// second run finds nothing to do and returns `None`.
    pub async fn migrate_legacy_schema(
        &self,
        page_size: usize,
    ) -> Result<Option<DocumentRecord>, StorageError> {
        let legacy = self
            .store
            .get(&[keys::LEGACY_FLAT_TEXT, keys::LEGACY_PAGE_INDEX])
            .await?;
        let Some(text) = legacy.get(keys::LEGACY_FLAT_TEXT).and_then(Value::as_str) else {
            return Ok(None);
        };

        let total_pages = paging::total_pages(text, page_size);
        let stored_index = legacy
            .get(keys::LEGACY_PAGE_INDEX)
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;

        let record = DocumentRecord {
            id: new_document_id(),
            title: LEGACY_TITLE.to_string(),
            full_text: text.to_string(),
            current_page_index: paging::clamp_index(stored_index, total_pages),
            total_pages,
            imported_at: now(),
        };

        let mut library = self.list_documents().await?;
        library.records.insert(record.id.clone(), record.clone());
        library.current_id = Some(record.id.clone());
        self.save(&library).await?;
        self.store
            .remove(&[keys::LEGACY_FLAT_TEXT, keys::LEGACY_PAGE_INDEX])
            .await?;

        info!(id = %record.id, pages = total_pages, "migrated legacy single-document layout");
        Ok(Some(record))
    }

    async fn save(&self, library: &Library) -> Result<(), StorageError> {
        let current = match &library.current_id {
            Some(id) => json!(id),
            None => Value::Null,
        };
        self.store
            .set(entries([
                (keys::RECORDS, serde_json::to_value(&library.records)?),
                (keys::CURRENT_ID, current),
            ]))
            .await
    }
}

fn entries<const N: usize>(pairs: [(&str, Value); N]) -> Entries {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
