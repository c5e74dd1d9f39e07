use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StorageError;

use super::{Entries, KeyValueStore, select};

/// Store persisted as a single JSON object on disk.
///
/// Every operation reads the whole file and writes it back through a
/// temporary file, so a crash never leaves a half-written store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Entries, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(Entries::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), keys = entries.len(), "saved store");
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Entries, StorageError> {
        Ok(select(&self.load()?, keys))
    }

    async fn set(&self, entries: Entries) -> Result<(), StorageError> {
        let mut all = self.load()?;
        all.extend(entries);
        self.save(&all)
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut all = self.load()?;
        for key in keys {
            all.remove(*key);
        }
        self.save(&all)
    }

    async fn get_all(&self) -> Result<Entries, StorageError> {
        self.load()
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.save(&Entries::new())
    }
}
