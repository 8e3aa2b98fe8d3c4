//! Byte backend over an object store

use crate::error::StoreError;
use crate::http::HttpObjectStore;
use crate::store::ObjectStore;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use object_cache::{Backend, Record, Result};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use url::Url;

/// Metadata field carrying a record's expiration
pub const EXPIRES_METADATA: &str = "expires";

/// Unix `date` layout, always in UTC
const EXPIRES_FORMAT: &str = "%a %b %d %H:%M:%S UTC %Y";

/// Render an expiration for the `expires` metadata field, e.g.
/// `Mon Jan  2 15:04:05 UTC 2006`. Sub-second precision is dropped.
pub fn format_expiration(expiration: DateTime<Utc>) -> String {
    expiration.format("%a %b %e %H:%M:%S UTC %Y").to_string()
}

/// Parse an `expires` metadata value; `None` if it is not in the expected layout
pub fn parse_expiration(raw: &str) -> Option<DateTime<Utc>> {
    // Day-of-month is space padded; collapse runs of whitespace first
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, EXPIRES_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Split `s3://bucket/prefix` into bucket and (percent-decoded) key prefix.
///
/// The prefix is used verbatim: `s3://b/cache/` stores `k` at `cache/k`,
/// while `s3://b/cache` stores it at `cachek`.
pub fn parse_store_uri(uri: &str) -> std::result::Result<(String, String), StoreError> {
    let parsed = Url::parse(uri).map_err(|e| StoreError::InvalidUri(format!("{}: {}", uri, e)))?;

    let bucket = parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| StoreError::InvalidUri(format!("{}: missing bucket", uri)))?
        .to_string();

    let prefix = urlencoding::decode(parsed.path().trim_start_matches('/'))
        .map_err(|e| StoreError::InvalidUri(format!("{}: {}", uri, e)))?
        .into_owned();

    Ok((bucket, prefix))
}

/// Stores each key as the object `prefix + key` in `bucket`.
pub struct ObjectStoreBackend<S> {
    store: S,
    bucket: String,
    prefix: String,
}

impl ObjectStoreBackend<HttpObjectStore> {
    /// Resolve `uri` (`s3://bucket/prefix`) against the endpoint for `region`.
    ///
    /// Requests are unsigned, so only public buckets (or endpoints that accept
    /// anonymous access) work. For anything else build an [`HttpObjectStore`]
    /// with [`HttpObjectStore::with_client`] and use [`with_store_uri`](Self::with_store_uri).
    pub fn from_uri(uri: &str, region: &str) -> std::result::Result<Self, StoreError> {
        let store = HttpObjectStore::for_region(region)?;
        Self::with_store_uri(store, uri)
    }
}

impl<S: ObjectStore> ObjectStoreBackend<S> {
    pub fn new(store: S, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        let backend = Self {
            store,
            bucket: bucket.into(),
            prefix: prefix.into(),
        };
        info!(bucket = %backend.bucket, prefix = %backend.prefix, "Object store cache initialized");
        backend
    }

    /// Use `store` for the bucket and prefix named by `uri`
    pub fn with_store_uri(store: S, uri: &str) -> std::result::Result<Self, StoreError> {
        let (bucket, prefix) = parse_store_uri(uri)?;
        Ok(Self::new(store, bucket, prefix))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn object_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl<S: ObjectStore> Backend for ObjectStoreBackend<S> {
    type Value = Vec<u8>;

    async fn add(
        &self,
        key: &str,
        value: Option<Vec<u8>>,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let object_key = self.object_key(key);

        let Some(body) = value else {
            return match self.store.delete_object(&self.bucket, &object_key).await {
                Ok(()) | Err(StoreError::NoSuchKey) => Ok(()),
                Err(e) => Err(e.into()),
            };
        };

        let mut metadata = HashMap::new();
        if let Some(expiration) = expiration {
            metadata.insert(EXPIRES_METADATA.to_string(), format_expiration(expiration));
        }

        self.store
            .put_object(&self.bucket, &object_key, body, metadata)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Record<Vec<u8>>>> {
        let object_key = self.object_key(key);

        let object = match self.store.get_object(&self.bucket, &object_key).await {
            Ok(object) => object,
            Err(StoreError::NoSuchKey) => return Ok(None),
            Err(e) => {
                warn!(
                    bucket = %self.bucket,
                    key = %object_key,
                    error = %e,
                    "Failed to fetch object"
                );
                return Err(e.into());
            }
        };

        let expiration = object.metadata.get(EXPIRES_METADATA).and_then(|raw| {
            let parsed = parse_expiration(raw);
            if parsed.is_none() {
                warn!(key = %object_key, expires = %raw, "Ignoring unparsable expiration");
            }
            parsed
        });

        if expiration.is_some_and(|exp| exp < Utc::now()) {
            debug!(key = %object_key, "Deleting expired object");
            self.delete(key).await?;
            return Ok(None);
        }

        Ok(Some(Record {
            value: object.body,
            expiration,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryObjectStore;
    use crate::store::StoredObject;
    use chrono::{Duration, TimeZone, Timelike};
    use object_cache::CacheError;
    use std::sync::Arc;

    fn backend() -> (Arc<MemoryObjectStore>, ObjectStoreBackend<Arc<MemoryObjectStore>>) {
        let store = Arc::new(MemoryObjectStore::new());
        let backend =
            ObjectStoreBackend::with_store_uri(store.clone(), "s3://kr-hacks/cache/").unwrap();
        (store, backend)
    }

    /// Store whose every call fails with a service error
    struct BrokenStore;

    #[async_trait]
    impl ObjectStore for BrokenStore {
        async fn get_object(
            &self,
            _bucket: &str,
            _key: &str,
        ) -> crate::error::Result<StoredObject> {
            Err(StoreError::Status {
                status: 403,
                code: Some("AccessDenied".to_string()),
                message: "Access Denied".to_string(),
            })
        }

        async fn put_object(
            &self,
            _bucket: &str,
            _key: &str,
            _body: Vec<u8>,
            _metadata: HashMap<String, String>,
        ) -> crate::error::Result<()> {
            Err(StoreError::Status {
                status: 500,
                code: Some("InternalError".to_string()),
                message: "We encountered an internal error".to_string(),
            })
        }

        async fn delete_object(&self, _bucket: &str, _key: &str) -> crate::error::Result<()> {
            Err(StoreError::NoSuchKey)
        }
    }

    #[test]
    fn test_parse_store_uri() {
        assert_eq!(
            parse_store_uri("s3://kr-hacks/cache").unwrap(),
            ("kr-hacks".to_string(), "cache".to_string())
        );
        assert_eq!(
            parse_store_uri("s3://bucket/nested/prefix%20with%20space/").unwrap(),
            ("bucket".to_string(), "nested/prefix with space/".to_string())
        );
        assert_eq!(
            parse_store_uri("s3://bucket").unwrap(),
            ("bucket".to_string(), "".to_string())
        );
    }

    #[test]
    fn test_parse_store_uri_rejects_garbage() {
        assert!(matches!(
            parse_store_uri("not a uri"),
            Err(StoreError::InvalidUri(_))
        ));
        assert!(matches!(
            parse_store_uri("s3:///prefix-only"),
            Err(StoreError::InvalidUri(_))
        ));
    }

    #[test]
    fn test_expiration_format() {
        let t = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(format_expiration(t), "Mon Jan  2 15:04:05 UTC 2006");
        assert_eq!(parse_expiration("Mon Jan  2 15:04:05 UTC 2006"), Some(t));

        let t = Utc.with_ymd_and_hms(2024, 11, 23, 8, 0, 59).unwrap();
        assert_eq!(parse_expiration(&format_expiration(t)), Some(t));
    }

    #[test]
    fn test_parse_expiration_rejects_other_layouts() {
        assert_eq!(parse_expiration("2006-01-02T15:04:05Z"), None);
        assert_eq!(parse_expiration("Mon Jan  2 15:04:05 PST 2006"), None);
        assert_eq!(parse_expiration(""), None);
    }

    #[tokio::test]
    async fn test_read_not_exists() {
        let (_, backend) = backend();
        assert_eq!(backend.get("not exists").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_read_delete_simple() {
        let (store, backend) = backend();

        backend
            .add("simple", Some(b"hello world".to_vec()), None)
            .await
            .unwrap();
        assert!(store.contains("kr-hacks", "cache/simple").await);

        let record = backend.get("simple").await.unwrap().unwrap();
        assert_eq!(record.value, b"hello world");
        assert_eq!(record.expiration, None);

        backend.delete("simple").await.unwrap();
        assert!(store.is_empty().await);
        assert_eq!(backend.get("simple").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expiration_travels_as_metadata() {
        let (store, backend) = backend();
        let expires = (Utc::now() + Duration::hours(1)).with_nanosecond(0).unwrap();

        backend
            .add("k", Some(b"v".to_vec()), Some(expires))
            .await
            .unwrap();

        let object = store.get_object("kr-hacks", "cache/k").await.unwrap();
        assert_eq!(
            object.metadata.get(EXPIRES_METADATA),
            Some(&format_expiration(expires))
        );

        let record = backend.get("k").await.unwrap().unwrap();
        assert_eq!(record.expiration, Some(expires));
    }

    #[tokio::test]
    async fn test_expired_object_is_deleted_on_read() {
        let (store, backend) = backend();
        let past = Utc::now() - Duration::minutes(5);

        backend.add("old", Some(b"v".to_vec()), Some(past)).await.unwrap();
        assert!(store.contains("kr-hacks", "cache/old").await);

        assert_eq!(backend.get("old").await.unwrap(), None);
        assert!(!store.contains("kr-hacks", "cache/old").await);
    }

    #[tokio::test]
    async fn test_unparsable_expiration_is_ignored() {
        let (store, backend) = backend();
        let metadata = HashMap::from([(EXPIRES_METADATA.to_string(), "tomorrow".to_string())]);
        store
            .put_object("kr-hacks", "cache/k", b"v".to_vec(), metadata)
            .await
            .unwrap();

        let record = backend.get("k").await.unwrap().unwrap();
        assert_eq!(record.value, b"v");
        assert_eq!(record.expiration, None);
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let backend = ObjectStoreBackend::new(BrokenStore, "bucket", "");

        let err = backend.get("k").await.unwrap_err();
        assert!(matches!(err, CacheError::Backend(_)));
        assert!(err.to_string().contains("AccessDenied"));

        let err = backend.add("k", Some(vec![1]), None).await.unwrap_err();
        assert!(err.to_string().contains("InternalError"));
    }

    #[tokio::test]
    async fn test_delete_of_missing_object_succeeds() {
        let backend = ObjectStoreBackend::new(BrokenStore, "bucket", "");
        backend.delete("k").await.unwrap();
    }
}
