//! In-process backend

use crate::backend::{Backend, Record};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A backend holding records in a map, with the same absence and
/// lazy-expiration rules as the persistent backends.
pub struct MemoryBackend<V> {
    records: RwLock<HashMap<String, Record<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V> MemoryBackend<V> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            clock: Arc::new(clock),
        }
    }

    /// Number of records currently held, including expired ones not yet read
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl<V> Default for MemoryBackend<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> Backend for MemoryBackend<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Value = V;

    async fn add(
        &self,
        key: &str,
        value: Option<V>,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        match value {
            Some(value) => {
                records.insert(key.to_string(), Record { value, expiration });
            }
            None => {
                records.remove(key);
            }
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Record<V>>> {
        let now = self.clock.now();
        {
            let records = self.records.read().await;
            match records.get(key) {
                None => return Ok(None),
                Some(record) if !record.is_expired(now) => return Ok(Some(record.clone())),
                Some(_) => {}
            }
        }

        debug!(key, "Purging expired record");
        let mut records = self.records.write().await;
        // Re-check under the write lock; the record may have been replaced.
        if records.get(key).is_some_and(|r| r.is_expired(now)) {
            records.remove(key);
            return Ok(None);
        }
        Ok(records.get(key).cloned())
    }
}
