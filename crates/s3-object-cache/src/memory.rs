//! In-process object store

use crate::error::{Result, StoreError};
use crate::store::{ObjectStore, StoredObject};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Objects held in a map keyed by `(bucket, key)`.
///
/// Mirrors S3: reading a missing object is `NoSuchKey`, deleting one succeeds.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .read()
            .await
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or(StoreError::NoSuchKey)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), StoredObject { body, metadata });
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}
