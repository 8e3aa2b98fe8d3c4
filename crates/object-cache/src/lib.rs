//! Pluggable key-value caching with a freshness-bounded fetch-through layer
//!
//! Storage implementations and decorators share one contract, [`Backend`],
//! so they compose freely:
//!
//! ```text
//! application -> FreshnessCache -> (Encoded ->) concrete backend
//! ```
//!
//! - [`FreshnessCache`] keeps an in-memory map with a local freshness deadline
//!   per key, populates misses through an optional [`Fetcher`] and evicts the
//!   soonest-to-expire entry when it grows past its bound.
//! - [`Encoded`] bridges structured values to byte-only backends through a
//!   [`Codec`].
//! - [`MemoryBackend`] is an in-process backend with the same absence and
//!   lazy-expiration rules as the file and object-store backends.
//!
//! # Example
//!
//! ```no_run
//! use object_cache::{fetch_with, Backend, FreshnessCache, MemoryBackend, Record};
//! use std::time::Duration;
//!
//! # async fn example() -> object_cache::Result<()> {
//! let cache = FreshnessCache::new(MemoryBackend::<String>::new(), Duration::from_secs(60), 1_000)
//!     .with_fetcher(fetch_with(|key: String| async move {
//!         Ok::<_, object_cache::CacheError>(Some(Record::new(format!("computed {key}"))))
//!     }));
//!
//! let record = cache.get("hello").await?;
//! assert_eq!(record.map(|r| r.value), Some("computed hello".to_string()));
//! # Ok(())
//! # }
//! ```

mod backend;
mod clock;
mod config;
mod error;
mod freshness;
mod marshaler;
mod memory;

pub use backend::{Backend, Record};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::FreshnessConfig;
pub use error::{CacheError, Result};
pub use freshness::{fetch_with, CacheStats, FetchFn, Fetcher, FreshnessCache, ERROR_PENALTY};
pub use marshaler::{Codec, Encoded, JsonCodec};
pub use memory::MemoryBackend;
