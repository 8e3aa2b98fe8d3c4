//! Freshness-bounded fetch-through cache
//!
//! Wraps any [`Backend`] with an in-memory map. Every entry carries a
//! freshness deadline; until it passes, reads are answered from memory without
//! touching the backend. Both successes and failures are memoized, failures
//! only for [`ERROR_PENALTY`].
//!
//! A single mutex guards the map and is held across backend I/O and fetcher
//! calls, so all reads and writes on one instance are serialized. A fetcher
//! must not call back into the cache that invoked it.
//!
//! Eviction removes the entry with the earliest freshness deadline, not the
//! least recently used one, and runs once after every `get`.

use crate::backend::{Backend, Record};
use crate::clock::{Clock, SystemClock};
use crate::config::FreshnessConfig;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// How long a failed read is memoized before the backend is tried again
pub const ERROR_PENALTY: Duration = Duration::from_secs(10);

/// Source of values for keys the backend does not hold.
#[async_trait]
pub trait Fetcher<V>: Send + Sync {
    /// `Ok(None)` means the key has no value anywhere.
    async fn fetch(&self, key: &str) -> Result<Option<Record<V>>>;
}

/// Adapts an async closure into a [`Fetcher`]; see [`fetch_with`].
pub struct FetchFn<F>(F);

/// Build a fetcher from a closure taking the owned key.
pub fn fetch_with<F>(f: F) -> FetchFn<F> {
    FetchFn(f)
}

#[async_trait]
impl<V, F, Fut> Fetcher<V> for FetchFn<F>
where
    V: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Record<V>>>> + Send + 'static,
{
    async fn fetch(&self, key: &str) -> Result<Option<Record<V>>> {
        (self.0)(key.to_string()).await
    }
}

/// Statistics about a freshness cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub fetches: u64,
    pub evictions: u64,
}

/// The memoized outcome of the last backend (or fetcher) read for a key
struct Entry<V> {
    outcome: Result<Option<Record<V>>>,
    fresh_until: DateTime<Utc>,
}

/// In-memory freshness layer over a [`Backend`].
pub struct FreshnessCache<B: Backend> {
    backend: B,
    entries: Mutex<HashMap<String, Entry<B::Value>>>,
    ttl: Duration,
    /// 0 disables eviction
    max_entries: usize,
    fetcher: Option<Arc<dyn Fetcher<B::Value>>>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    evictions: AtomicU64,
}

impl<B> FreshnessCache<B>
where
    B: Backend,
    B::Value: Clone,
{
    /// Create a cache serving successful reads for `ttl` and holding roughly
    /// `max_entries` entries (0 = unbounded)
    pub fn new(backend: B, ttl: Duration, max_entries: usize) -> Self {
        Self {
            backend,
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries,
            fetcher: None,
            clock: Arc::new(SystemClock),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn from_config(backend: B, config: &FreshnessConfig) -> Self {
        Self::new(backend, config.ttl, config.max_entries)
    }

    /// Populate true misses from `fetcher` and write its results back
    pub fn with_fetcher(mut self, fetcher: impl Fetcher<B::Value> + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// The wrapped backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of resident entries, fresh or stale
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Whether `key` currently has an in-memory entry
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().await;
        CacheStats {
            entries: entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    async fn locked_get(
        &self,
        entries: &mut HashMap<String, Entry<B::Value>>,
        key: &str,
    ) -> Result<Option<Record<B::Value>>> {
        if let Some(entry) = entries.get(key) {
            if entry.fresh_until > self.clock.now() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Cache hit");
                return entry.outcome.clone();
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key, "Cache miss");

        let mut outcome = self.backend.get(key).await;
        if matches!(outcome, Ok(None)) {
            if let Some(fetcher) = &self.fetcher {
                outcome = self.fetch_through(fetcher.as_ref(), key).await;
            }
        }

        let fresh_until = freshness_deadline(self.clock.now(), self.ttl, &outcome);
        entries.insert(
            key.to_string(),
            Entry {
                outcome: outcome.clone(),
                fresh_until,
            },
        );
        outcome
    }

    /// Ask the fetcher for `key` and persist a successful result. A failed
    /// write-back is logged and otherwise ignored.
    async fn fetch_through(
        &self,
        fetcher: &dyn Fetcher<B::Value>,
        key: &str,
    ) -> Result<Option<Record<B::Value>>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        debug!(key, "Fetching missing key");

        let fetched = fetcher.fetch(key).await;
        if let Ok(Some(record)) = &fetched {
            if let Err(e) = self
                .backend
                .add(key, Some(record.value.clone()), record.expiration)
                .await
            {
                warn!(key, error = %e, "Failed to write fetched value back to backend");
            }
        }
        fetched
    }

    /// Drop the entry with the earliest freshness deadline if over the bound
    async fn evict_if_needed(&self) {
        if self.max_entries == 0 {
            return;
        }

        let mut entries = self.entries.lock().await;
        if entries.len() <= self.max_entries {
            return;
        }

        let soonest = entries
            .iter()
            .min_by_key(|(_, e)| e.fresh_until)
            .map(|(k, _)| k.clone());

        if let Some(key) = soonest {
            entries.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Evicted soonest-expiring entry");
        }
    }
}

#[async_trait]
impl<B> Backend for FreshnessCache<B>
where
    B: Backend,
    B::Value: Clone,
{
    type Value = B::Value;

    /// Invalidate the in-memory entry, then write through to the backend.
    async fn add(
        &self,
        key: &str,
        value: Option<Self::Value>,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        self.backend.add(key, value, expiration).await
    }

    async fn get(&self, key: &str) -> Result<Option<Record<Self::Value>>> {
        let outcome = {
            let mut entries = self.entries.lock().await;
            self.locked_get(&mut entries, key).await
        };
        self.evict_if_needed().await;
        outcome
    }
}

fn deadline_after(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|w| now.checked_add_signed(w))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Errors stay fresh for [`ERROR_PENALTY`]; successes for `ttl`, but never
/// past the backend's own expiration.
fn freshness_deadline<V>(
    now: DateTime<Utc>,
    ttl: Duration,
    outcome: &Result<Option<Record<V>>>,
) -> DateTime<Utc> {
    match outcome {
        Err(_) => deadline_after(now, ERROR_PENALTY),
        Ok(record) => {
            let candidate = deadline_after(now, ttl);
            match record.as_ref().and_then(|r| r.expiration) {
                Some(expiration) if expiration < candidate => expiration,
                _ => candidate,
            }
        }
    }
}
