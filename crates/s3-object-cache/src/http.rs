//! Path-style S3 REST client

use crate::error::{Result, StoreError};
use crate::store::{ObjectStore, StoredObject};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Header prefix carrying user metadata
const META_PREFIX: &str = "x-amz-meta-";

/// Default S3 endpoint for a region; an empty region uses the global endpoint
pub fn region_endpoint(region: &str) -> String {
    if region.is_empty() {
        "https://s3.amazonaws.com".to_string()
    } else {
        format!("https://s3.{}.amazonaws.com", region)
    }
}

/// Object store client addressing objects as `{endpoint}/{bucket}/{key}`.
///
/// Requests are sent unsigned.
pub struct HttpObjectStore {
    http: Client,
    endpoint: String,
}

impl HttpObjectStore {
    /// Client for the AWS endpoint of `region` (30 second timeout).
    ///
    /// Requests are unsigned; private buckets answer 403 `AccessDenied`.
    pub fn for_region(region: &str) -> Result<Self> {
        Self::with_endpoint(region_endpoint(region))
    }

    /// Client for an S3-compatible endpoint such as `http://localhost:9000`
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self::with_client(http, endpoint))
    }

    /// Use a caller-configured client, e.g. one carrying default auth headers
    pub fn with_client(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        let encoded_key = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/{}/{}",
            self.endpoint,
            urlencoding::encode(bucket),
            encoded_key
        )
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        let url = self.object_url(bucket, key);
        debug!(url = %url, "GET object");

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let metadata = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let field = name.as_str().strip_prefix(META_PREFIX)?;
                let value = value.to_str().ok()?;
                Some((field.to_string(), value.to_string()))
            })
            .collect();

        let body = response.bytes().await?.to_vec();
        debug!(url = %url, size = body.len(), "Fetched object");

        Ok(StoredObject { body, metadata })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        let url = self.object_url(bucket, key);
        debug!(url = %url, size = body.len(), "PUT object");

        let mut request = self.http.put(&url).body(body);
        for (field, value) in metadata {
            request = request.header(format!("{}{}", META_PREFIX, field), value);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let url = self.object_url(bucket, key);
        debug!(url = %url, "DELETE object");

        let response = self.http.delete(&url).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }
}

/// Turn a failed response into a [`StoreError`], reading the S3 XML error body
async fn error_from_response(response: Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let code = extract_tag(&body, "Code");

    match code.as_deref() {
        Some("NoSuchKey") => return StoreError::NoSuchKey,
        None if status == StatusCode::NOT_FOUND => return StoreError::NoSuchKey,
        _ => {}
    }

    let message = extract_tag(&body, "Message").unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    });

    StoreError::Status {
        status: status.as_u16(),
        code,
        message,
    }
}

/// Text of the first `<tag>...</tag>` element in `xml`
fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    Some(xml[start..end].trim().to_string())
}
