use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// An object body with its user metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    /// User metadata, keys lowercased and without any transport prefix
    pub metadata: HashMap<String, String>,
}

/// Minimal object store operations used by [`ObjectStoreBackend`](crate::ObjectStoreBackend).
///
/// `get_object` must report a missing object as
/// [`StoreError::NoSuchKey`](crate::StoreError::NoSuchKey).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject>;

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        metadata: HashMap<String, String>,
    ) -> Result<()>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;
}

#[async_trait]
impl<S> ObjectStore for Arc<S>
where
    S: ObjectStore + ?Sized,
{
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        (**self).get_object(bucket, key).await
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        (**self).put_object(bucket, key, body, metadata).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        (**self).delete_object(bucket, key).await
    }
}
