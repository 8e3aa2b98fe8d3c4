//! On-disk record layout

use chrono::{DateTime, Utc};
use object_cache::Record;
use serde::{Deserialize, Serialize};

/// What a single cache file contains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord<V> {
    pub value: V,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
}

impl<V> From<StoredRecord<V>> for Record<V> {
    fn from(stored: StoredRecord<V>) -> Self {
        Record {
            value: stored.value,
            expiration: stored.expiration,
        }
    }
}
