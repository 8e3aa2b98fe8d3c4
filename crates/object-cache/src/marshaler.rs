//! Value encoding decorator
//!
//! [`Encoded`] lets structured values be stored in backends that only accept
//! byte sequences. Deleting (`None`) passes through untouched.

use crate::backend::{Backend, Record};
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// Converts values of type `V` to and from bytes.
pub trait Codec<V>: Send + Sync {
    fn encode(&self, value: &V) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<V>;
}

/// JSON encoding via serde_json
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<V> Codec<V> for JsonCodec
where
    V: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &V) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<V> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Exposes a byte backend as a backend of `V`.
pub struct Encoded<B, C, V> {
    inner: B,
    codec: C,
    _value: PhantomData<fn() -> V>,
}

impl<B, V> Encoded<B, JsonCodec, V> {
    pub fn json(inner: B) -> Self {
        Self::new(inner, JsonCodec)
    }
}

impl<B, C, V> Encoded<B, C, V> {
    pub fn new(inner: B, codec: C) -> Self {
        Self {
            inner,
            codec,
            _value: PhantomData,
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B, C, V> Backend for Encoded<B, C, V>
where
    B: Backend<Value = Vec<u8>>,
    C: Codec<V>,
    V: Send + Sync + 'static,
{
    type Value = V;

    async fn add(
        &self,
        key: &str,
        value: Option<V>,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let bytes = value.map(|v| self.codec.encode(&v)).transpose()?;
        self.inner.add(key, bytes, expiration).await
    }

    /// Bytes that do not decode as `V` mean something else wrote this key;
    /// that is reported as an invariant violation, not a transient failure.
    async fn get(&self, key: &str) -> Result<Option<Record<V>>> {
        let Some(record) = self.inner.get(key).await? else {
            return Ok(None);
        };

        let value = self.codec.decode(&record.value).map_err(|e| {
            CacheError::InvariantViolation(format!(
                "stored payload for {:?} does not decode: {}",
                key, e
            ))
        })?;

        Ok(Some(Record {
            value,
            expiration: record.expiration,
        }))
    }
}
