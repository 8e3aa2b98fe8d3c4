//! Assembles the configured cache stack

use crate::cli::{BackendArgs, BackendKind};
use crate::error::{CliError, Result};
use file_object_cache::FileBackend;
use object_cache::{Backend, Encoded, FreshnessCache, FreshnessConfig};
use s3_object_cache::{HttpObjectStore, ObjectStoreBackend};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub type DynBackend = Arc<dyn Backend<Value = Value>>;

/// Build the storage backend for `args`
pub async fn build_backend(args: &BackendArgs) -> Result<DynBackend> {
    match args.backend {
        BackendKind::File => {
            let files = FileBackend::<Value>::open(args.dir.clone())?;
            files.init().await?;
            info!(dir = ?files.dir(), "Using file backend");
            let backend: DynBackend = Arc::new(files);
            Ok(backend)
        }
        BackendKind::S3 => {
            let uri = args.uri.as_deref().ok_or_else(|| {
                CliError::Config("the s3 backend needs OBJECT_CACHE_URI".to_string())
            })?;

            let store = match &args.endpoint {
                Some(endpoint) => HttpObjectStore::with_endpoint(endpoint.as_str())?,
                None => HttpObjectStore::for_region(&args.region)?,
            };
            info!(uri, endpoint = store.endpoint(), "Using object store backend");

            let objects = ObjectStoreBackend::with_store_uri(store, uri)?;
            let backend: DynBackend = Arc::new(Encoded::<_, _, Value>::json(objects));
            Ok(backend)
        }
    }
}

/// The full stack: freshness cache over the configured backend
pub async fn build_cache(
    args: &BackendArgs,
    config: &FreshnessConfig,
) -> Result<FreshnessCache<DynBackend>> {
    let backend = build_backend(args).await?;
    info!(
        ttl_secs = config.ttl.as_secs(),
        max_entries = config.max_entries,
        "Freshness cache configured"
    );
    Ok(FreshnessCache::from_config(backend, config))
}
