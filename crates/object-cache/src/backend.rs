//! The contract every storage implementation and decorator shares

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A stored value together with its optional absolute expiration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<V> {
    pub value: V,
    /// `None` means the record never expires at the backend level
    pub expiration: Option<DateTime<Utc>>,
}

impl<V> Record<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            expiration: None,
        }
    }

    pub fn expiring(value: V, expiration: DateTime<Utc>) -> Self {
        Self {
            value,
            expiration: Some(expiration),
        }
    }

    /// A record whose expiration is strictly before `now` must not be served.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|exp| exp < now)
    }
}

/// Key-value storage with optional per-record expiration.
///
/// Implementations must follow these rules:
/// - `get` on an absent or expired key returns `Ok(None)`; errors are reserved
///   for genuine I/O or transport failures.
/// - `add` with `None` deletes the key. Deleting an absent key succeeds.
/// - A record whose expiration has passed is purged on the next `get`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Payload type accepted and returned by this layer
    type Value: Send + Sync + 'static;

    async fn add(
        &self,
        key: &str,
        value: Option<Self::Value>,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Record<Self::Value>>>;

    async fn delete(&self, key: &str) -> Result<()> {
        self.add(key, None, None).await
    }
}

#[async_trait]
impl<B> Backend for Arc<B>
where
    B: Backend + ?Sized,
{
    type Value = B::Value;

    async fn add(
        &self,
        key: &str,
        value: Option<Self::Value>,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<()> {
        (**self).add(key, value, expiration).await
    }

    async fn get(&self, key: &str) -> Result<Option<Record<Self::Value>>> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }
}
