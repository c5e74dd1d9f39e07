use serde_json::json;
use tempfile::TempDir;

use touchfish::store::{Entries, keys};
use touchfish::{DocumentRecord, JsonFileStore, KeyValueStore, LibraryStore, MemoryStore, StorageError};

/// Store that yields to the executor before every operation, so concurrent
/// read-modify-write sequences interleave the way separate contexts do.
#[derive(Clone, Default)]
struct YieldingStore(MemoryStore);

impl KeyValueStore for YieldingStore {
    async fn get(&self, keys: &[&str]) -> Result<Entries, StorageError> {
        tokio::task::yield_now().await;
        self.0.get(keys).await
    }

    async fn set(&self, entries: Entries) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        self.0.set(entries).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        self.0.remove(keys).await
    }

    async fn get_all(&self) -> Result<Entries, StorageError> {
        tokio::task::yield_now().await;
        self.0.get_all().await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        self.0.clear().await
    }
}

#[tokio::test]
async fn test_concurrent_imports_last_write_wins() {
    let store = YieldingStore::default();
    let popup = LibraryStore::new(store.clone());
    let page = LibraryStore::new(store.clone());

    let (a, b) = tokio::join!(
        popup.import_document("first book", None, 100),
        page.import_document("second book", None, 100),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    // Both read the empty library before either wrote, so one insert is lost
    let listed = popup.list_documents().await.unwrap();
    assert_eq!(listed.records.len(), 1);
    let survivor = listed.current().unwrap();
    assert!(survivor.id == a.id || survivor.id == b.id);
}

#[tokio::test]
async fn test_page_turn_racing_delete_loses_one_write() {
    let store = YieldingStore::default();
    let popup = LibraryStore::new(store.clone());
    let page = LibraryStore::new(store.clone());

    let keep = popup.import_document("kept", None, 100).await.unwrap();
    let doomed = popup.import_document(&"z".repeat(300), None, 100).await.unwrap();

    let (turned, deleted) = tokio::join!(
        page.update_current_page(&doomed.id, 2, 100),
        popup.delete_document(&doomed.id),
    );
    turned.unwrap();
    deleted.unwrap();

    let listed = popup.list_documents().await.unwrap();
    assert!(listed.records.contains_key(&keep.id));
    match listed.records.get(&doomed.id) {
        // The page-turn write landed last and resurrected the record
        Some(record) => assert_eq!(record.current_page_index, 2),
        // The delete landed last and the page turn is gone with it
        None => assert_eq!(listed.records.len(), 1),
    }
}

#[tokio::test]
async fn test_sequential_writes_are_not_lost() {
    let store = YieldingStore::default();
    let library = LibraryStore::new(store);

    let a = library.import_document("first", None, 100).await.unwrap();
    let b = library.import_document("second", None, 100).await.unwrap();
    library.update_current_page(&a.id, 0, 100).await.unwrap();

    let listed = library.list_documents().await.unwrap();
    assert_eq!(listed.records.len(), 2);
    assert_eq!(listed.current_id, Some(b.id));
}

#[tokio::test]
async fn test_delete_current_keeps_pointer_valid() {
    let library = LibraryStore::new(MemoryStore::new());
    let ids: Vec<String> = import_many(&library, 3).await;

    let current = library.delete_document(&ids[2]).await.unwrap().unwrap();
    assert!(ids[..2].contains(&current));

    let listed = library.list_documents().await.unwrap();
    assert!(listed.records.contains_key(&current));
    assert_eq!(listed.current_id.as_ref(), Some(&current));
}

async fn import_many(library: &LibraryStore<MemoryStore>, count: usize) -> Vec<String> {
    let mut ids = Vec::new();
    for i in 0..count {
        let record = library
            .import_document(&format!("book number {i}"), None, 100)
            .await
            .unwrap();
        ids.push(record.id);
    }
    ids
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("library").join("store.json");

    let imported: DocumentRecord = {
        let library = LibraryStore::new(JsonFileStore::new(&path));
        let record = library
            .import_document(&"w".repeat(250), Some("Walden"), 100)
            .await
            .unwrap();
        library.update_current_page(&record.id, 1, 100).await.unwrap();
        record
    };

    let reopened = LibraryStore::new(JsonFileStore::new(&path));
    let current = reopened.current_document().await.unwrap().unwrap();
    assert_eq!(current.id, imported.id);
    assert_eq!(current.title, "Walden");
    assert_eq!(current.current_page_index, 1);
    assert_eq!(current.total_pages, 3);
    assert_eq!(current.imported_at, imported.imported_at);
}

#[tokio::test]
async fn test_legacy_migration_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let legacy: Entries = [
        (keys::LEGACY_FLAT_TEXT, json!("An old single book that predates the library.")),
        (keys::LEGACY_PAGE_INDEX, json!(0)),
        (keys::SESSION_ACTIVE, json!(true)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    std::fs::write(&path, serde_json::to_string(&legacy).unwrap()).unwrap();

    let library = LibraryStore::new(JsonFileStore::new(&path));
    let migrated = library.migrate_legacy_schema(100).await.unwrap().unwrap();
    assert_eq!(migrated.total_pages, 1);
    let once = library.store().get_all().await.unwrap();

    assert_eq!(library.migrate_legacy_schema(100).await.unwrap(), None);
    let twice = library.store().get_all().await.unwrap();

    assert_eq!(once, twice);
    assert!(!twice.contains_key(keys::LEGACY_FLAT_TEXT));
    assert!(!twice.contains_key(keys::LEGACY_PAGE_INDEX));
    assert_eq!(twice[keys::SESSION_ACTIVE], json!(true));
    assert_eq!(twice[keys::CURRENT_ID], json!(migrated.id));
}

#[tokio::test]
async fn test_corrupt_records_are_reported() {
    let store = MemoryStore::new();
    store
        .set([(keys::RECORDS.to_string(), json!("not a map"))].into_iter().collect())
        .await
        .unwrap();
    let library = LibraryStore::new(store);
    assert_eq!(library.list_documents().await.unwrap_err().kind(), "Corrupt");
}
