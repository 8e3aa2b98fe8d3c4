//! One-file-per-key backend

use crate::types::StoredRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use object_cache::{Backend, CacheError, Record, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// A backend storing each key as a file named exactly `key` in a directory
pub struct FileBackend<V> {
    /// Directory where records are stored
    dir: PathBuf,
    _value: PhantomData<fn() -> V>,
}

impl<V> FileBackend<V> {
    /// Use `dir` for storage. Call [`init`](Self::init) if it may not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _value: PhantomData,
        }
    }

    /// Store records in a freshly created private temporary directory.
    ///
    /// The directory is left in place when the backend is dropped.
    pub fn temporary() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("fsoc").tempdir()?.keep();
        info!(dir = ?dir, "Created temporary cache directory");
        Ok(Self::new(dir))
    }

    /// `Some(dir)` behaves like [`new`](Self::new), `None` like [`temporary`](Self::temporary)
    pub fn open(dir: Option<PathBuf>) -> Result<Self> {
        match dir {
            Some(dir) => Ok(Self::new(dir)),
            None => Self::temporary(),
        }
    }

    /// Ensure the storage directory exists
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        info!(dir = ?self.dir, "File cache initialized");
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let escapes = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\', '\0']);
        if escapes {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

/// Remove a file, treating an already-missing file as success
async fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl<V> Backend for FileBackend<V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    type Value = V;

    async fn add(
        &self,
        key: &str,
        value: Option<V>,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let path = self.path_for(key)?;

        let Some(value) = value else {
            debug!(key, "Deleting record");
            return remove_if_present(&path).await;
        };

        let encoded = serde_json::to_vec(&StoredRecord {
            value: &value,
            expiration,
        })?;
        // Stage in a sibling temp file, then rename over the record
        let staged = tempfile::NamedTempFile::new_in(&self.dir)?.into_temp_path();
        fs::write(&staged, &encoded).await?;
        staged.persist(&path).map_err(std::io::Error::from)?;
        debug!(key, size = encoded.len(), "Stored record");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Record<V>>> {
        let path = self.path_for(key)?;

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredRecord<V> = serde_json::from_slice(&bytes)?;
        if stored.expiration.is_some_and(|exp| exp < Utc::now()) {
            debug!(key, "Removing expired record");
            remove_if_present(&path).await?;
            return Ok(None);
        }

        Ok(Some(stored.into()))
    }
}
