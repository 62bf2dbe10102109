//! Shared fixtures for agent tests: a scripted backend and configuration.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use moot_backend::{
    CompletionClient, CompletionRequest, CompletionResponse, Connection, Transport,
};
use moot_config::AppConfig;
use moot_core::error::BackendError;

/// A connection that replays scripted results and records every request.
pub(crate) struct ScriptedConnection {
    script: StdMutex<VecDeque<Result<CompletionResponse, BackendError>>>,
    requests: StdMutex<Vec<CompletionRequest>>,
}

impl ScriptedConnection {
    pub(crate) fn new(script: Vec<Result<CompletionResponse, BackendError>>) -> Self {
        Self {
            script: StdMutex::new(script.into()),
            requests: StdMutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn send(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedConnection exhausted")
    }
}

pub(crate) struct ScriptedTransport {
    connection: Arc<ScriptedConnection>,
}

impl Transport for ScriptedTransport {
    fn connect(&self) -> Arc<dyn Connection> {
        self.connection.clone()
    }
}

pub(crate) fn response(content: &str, slot: Option<i64>, stopped: bool) -> CompletionResponse {
    CompletionResponse {
        content: content.into(),
        stopped_eos: stopped,
        stopped_word: false,
        id_slot: slot,
        slot_id: None,
    }
}

pub(crate) fn transport_err() -> BackendError {
    BackendError::Transport("connection refused".into())
}

pub(crate) fn config() -> AppConfig {
    AppConfig::default()
}

/// A completion client over a scripted connection, returned alongside the
/// connection for request inspection.
pub(crate) fn scripted_client(
    script: Vec<Result<CompletionResponse, BackendError>>,
    config: &AppConfig,
) -> (CompletionClient, Arc<ScriptedConnection>) {
    let connection = Arc::new(ScriptedConnection::new(script));
    let transport = Arc::new(ScriptedTransport {
        connection: connection.clone(),
    });
    (CompletionClient::new(transport, config), connection)
}
