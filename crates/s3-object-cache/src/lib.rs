//! Object-store backed object cache
//!
//! [`ObjectStoreBackend`] keeps one object per key under `bucket` at
//! `prefix + key`. Payloads are raw bytes; wrap the backend in
//! [`object_cache::Encoded`] to store structured values. A record's expiration
//! travels as the `expires` object metadata field and is enforced lazily on
//! read.
//!
//! The store itself sits behind the [`ObjectStore`] trait:
//! - [`HttpObjectStore`] speaks path-style S3 REST over reqwest. It does not
//!   sign requests; supply a preconfigured client with
//!   [`HttpObjectStore::with_client`] where the endpoint needs credentials.
//! - [`MemoryObjectStore`] keeps objects in process, for tests and local runs.
//!
//! # Example
//!
//! ```no_run
//! use object_cache::Backend;
//! use s3_object_cache::ObjectStoreBackend;
//!
//! # async fn example() -> object_cache::Result<()> {
//! let backend = ObjectStoreBackend::from_uri("s3://my-bucket/cache/", "us-west-2")?;
//! backend.add("greeting", Some(b"hello world".to_vec()), None).await?;
//! let record = backend.get("greeting").await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;
mod http;
mod memory;
mod store;

pub use backend::{
    format_expiration, parse_expiration, parse_store_uri, ObjectStoreBackend, EXPIRES_METADATA,
};
pub use error::StoreError;
pub use http::{region_endpoint, HttpObjectStore};
pub use memory::MemoryObjectStore;
pub use store::{ObjectStore, StoredObject};
