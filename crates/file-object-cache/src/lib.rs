//! File-backed object cache with lazy expiration
//!
//! Stores one file per key inside a directory. Each file holds the value and
//! its optional expiration as a JSON record, so any serde-serializable value
//! can be stored. Expired records are deleted the next time they are read.

mod cache;
mod types;

pub use cache::FileBackend;
pub use types::StoredRecord;
