//! The transport seam between the completion client and the backend.
//!
//! A [`Transport`] opens [`Connection`]s; the client keeps one connection
//! per conversation for the lifetime of its slot affinity. Tests swap in
//! scripted implementations; production uses [`HttpTransport`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moot_core::error::BackendError;
use tracing::warn;

use crate::wire::{CompletionRequest, CompletionResponse};

/// A live channel to the backend. One per conversation slot.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Send one completion request and decode the response.
    async fn send(&self, request: &CompletionRequest)
    -> Result<CompletionResponse, BackendError>;
}

/// Opens connections to one backend.
pub trait Transport: Send + Sync {
    fn connect(&self) -> Arc<dyn Connection>;
}

/// HTTP transport against a llama.cpp-style `/completion` endpoint.
pub struct HttpTransport {
    endpoint: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

impl Transport for HttpTransport {
    fn connect(&self) -> Arc<dyn Connection> {
        Arc::new(HttpConnection {
            endpoint: self.endpoint.clone(),
            client: reqwest::Client::builder()
                .timeout(self.timeout)
                .build()
                .expect("Failed to create HTTP client"),
        })
    }
}

struct HttpConnection {
    endpoint: String,
    client: reqwest::Client,
}

#[async_trait]
impl Connection for HttpConnection {
    async fn send(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(e.to_string())
                } else {
                    BackendError::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Backend returned error");
            return Err(BackendError::Protocol {
                status,
                message: body,
            });
        }

        response
            .json::<CompletionResponse>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}
