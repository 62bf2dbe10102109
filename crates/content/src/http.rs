//! HTTP client for an IPFS-compatible content store.

use std::time::Duration;

use async_trait::async_trait;
use moot_config::ContentConfig;
use moot_core::error::ContentError;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::ContentStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Store backed by an IPFS node: writes go to the API port, reads through
/// the gateway.
pub struct HttpStore {
    client: reqwest::Client,
    api_url: String,
    gateway_url: String,
}

impl HttpStore {
    pub fn new(config: &ContentConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ContentStore for HttpStore {
    async fn add(&self, bytes: Vec<u8>) -> Result<String, ContentError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("transcript.json")
            .mime_str("application/json")
            .map_err(|e| ContentError::Store(format!("building upload: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/api/v0/add", self.api_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ContentError::Store(format!("add request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Content store rejected add");
            return Err(ContentError::Store(format!("add returned {status}")));
        }

        let added: AddResponse = response
            .json()
            .await
            .map_err(|e| ContentError::Store(format!("malformed add response: {e}")))?;
        debug!(content = %added.hash, "Added content");
        Ok(added.hash)
    }

    async fn get(&self, content_id: &str) -> Result<Vec<u8>, ContentError> {
        let response = self
            .client
            .get(format!("{}/ipfs/{content_id}", self.gateway_url))
            .send()
            .await
            .map_err(|e| ContentError::Store(format!("get request: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ContentError::NotFound(content_id.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Content store get failed");
            return Err(ContentError::Store(format!("get returned {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ContentError::Store(format!("reading body: {e}")))?;
        Ok(bytes.to_vec())
    }
}

// --- API types ---

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}
