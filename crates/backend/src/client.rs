//! The completion client: bounded-retry calls with per-conversation slot
//! affinity.
//!
//! The backend caches evaluated context in server-side "slots". Keeping one
//! connection and slot id per conversation lets consecutive rounds reuse
//! that cache instead of re-evaluating the whole prompt. The affinity table
//! lives on the client instance and is never shared globally; entries are
//! ephemeral and a restart simply starts fresh slots.

use std::collections::HashMap;
use std::sync::Arc;

use moot_config::AppConfig;
use moot_core::error::{BackendError, CompletionError};
use moot_core::message::ConversationId;
use moot_core::token::count_tokens;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::transport::{Connection, Transport};
use crate::wire::{CompletionRequest, NO_SLOT};

/// Result of one successful completion call.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub text: String,

    /// Locally recounted tokens; the backend's own count is never trusted.
    pub token_count: usize,

    /// True iff the backend reported end-of-sequence or a stop-word match.
    pub stopped: bool,
}

/// One conversation's affinity: the connection it speaks through and the
/// server slot holding its cached context.
struct Slot {
    connection: Arc<dyn Connection>,
    slot_id: i64,
}

/// Client for the completion backend.
///
/// Calls for the same conversation serialize on that conversation's slot;
/// calls for distinct conversations never contend beyond a brief table
/// lookup.
pub struct CompletionClient {
    transport: Arc<dyn Transport>,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_completion_tokens: usize,
    max_attempts: usize,
    stop_sequences: Vec<String>,
    slots: Mutex<HashMap<i64, Arc<Mutex<Slot>>>>,
}

impl CompletionClient {
    pub fn new(transport: Arc<dyn Transport>, config: &AppConfig) -> Self {
        Self {
            transport,
            temperature: config.backend.temperature,
            top_p: config.backend.top_p,
            top_k: config.backend.top_k,
            max_completion_tokens: config.backend.max_completion_tokens,
            max_attempts: config.backend.max_attempts,
            stop_sequences: config.prompt.stop_sequences.clone(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Complete `prompt` for `conversation_id`.
    ///
    /// Reuses the conversation's connection/slot when present, otherwise
    /// opens a fresh connection with the no-slot sentinel. Every attempt
    /// goes out on the same connection and slot; on success the affinity is
    /// refreshed from the response before returning, stopped or not, so the
    /// server cache stays valid for the next round.
    pub async fn complete(
        &self,
        prompt: &str,
        conversation_id: ConversationId,
    ) -> Result<CompletionOutcome, CompletionError> {
        let entry = self.entry(conversation_id).await;
        let mut slot = entry.lock().await;

        let request = CompletionRequest {
            prompt: prompt.to_string(),
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            n_predict: self.max_completion_tokens,
            id_slot: slot.slot_id,
            slot_id: slot.slot_id,
            typical_p: 1.0,
            tfs_z: 1.0,
            stop: self.stop_sequences.clone(),
            cache_prompt: true,
            use_default_badwordsids: false,
        };

        let mut errors = Vec::new();
        for attempt in 1..=self.max_attempts {
            debug!(
                conversation = %conversation_id,
                attempt,
                slot = slot.slot_id,
                "Sending completion request"
            );
            match slot.connection.send(&request).await {
                Ok(response) => {
                    if let Some(id) = response.slot() {
                        slot.slot_id = id;
                    }
                    let stopped = response.stopped();
                    let token_count = count_tokens(&response.content);
                    if token_count > self.max_completion_tokens {
                        warn!(
                            conversation = %conversation_id,
                            token_count,
                            cap = self.max_completion_tokens,
                            "Completion exceeded the token cap"
                        );
                    }
                    return Ok(CompletionOutcome {
                        text: response.content,
                        token_count,
                        stopped,
                    });
                }
                Err(e) => {
                    warn!(
                        conversation = %conversation_id,
                        attempt,
                        error = %e,
                        "Completion attempt failed"
                    );
                    errors.push(e);
                }
            }
        }

        Err(CompletionError { attempts: errors })
    }

    /// The slot id currently held for a conversation, if any.
    pub async fn slot_id(&self, conversation_id: ConversationId) -> Option<i64> {
        let entry = {
            let slots = self.slots.lock().await;
            slots.get(&conversation_id.0)?.clone()
        };
        let slot = entry.lock().await;
        Some(slot.slot_id)
    }

    /// Discard a conversation's affinity. The next call opens a fresh
    /// connection and starts a new slot.
    pub async fn release(&self, conversation_id: ConversationId) {
        let removed = self.slots.lock().await.remove(&conversation_id.0);
        if removed.is_some() {
            debug!(conversation = %conversation_id, "Released slot affinity");
        }
    }

    /// Discard every affinity entry (shutdown).
    pub async fn release_all(&self) {
        self.slots.lock().await.clear();
    }

    async fn entry(&self, conversation_id: ConversationId) -> Arc<Mutex<Slot>> {
        let mut slots = self.slots.lock().await;
        slots
            .entry(conversation_id.0)
            .or_insert_with(|| {
                Arc::new(Mutex::new(Slot {
                    connection: self.transport.connect(),
                    slot_id: NO_SLOT,
                }))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::CompletionResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    /// A connection that replays scripted results and records requests.
    struct ScriptedConnection {
        script: StdMutex<VecDeque<Result<CompletionResponse, BackendError>>>,
        requests: StdMutex<Vec<CompletionRequest>>,
    }

    impl ScriptedConnection {
        fn new(script: Vec<Result<CompletionResponse, BackendError>>) -> Self {
            Self {
                script: StdMutex::new(script.into()),
                requests: StdMutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn request(&self, i: usize) -> CompletionRequest {
            self.requests.lock().unwrap()[i].clone()
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

    struct ScriptedTransport {
        connection: Arc<ScriptedConnection>,
        connects: StdMutex<usize>,
    }

    impl ScriptedTransport {
        fn new(connection: Arc<ScriptedConnection>) -> Self {
            Self {
                connection,
                connects: StdMutex::new(0),
            }
        }

        fn connects(&self) -> usize {
            *self.connects.lock().unwrap()
        }
    }

    impl Transport for ScriptedTransport {
        fn connect(&self) -> Arc<dyn Connection> {
            *self.connects.lock().unwrap() += 1;
            self.connection.clone()
        }
    }

    fn response(content: &str, slot: Option<i64>, stopped: bool) -> CompletionResponse {
        CompletionResponse {
            content: content.into(),
            stopped_eos: stopped,
            stopped_word: false,
            id_slot: slot,
            slot_id: None,
        }
    }

    fn transport_err() -> BackendError {
        BackendError::Transport("connection refused".into())
    }

    fn config(max_attempts: usize) -> AppConfig {
        let mut config = AppConfig::default();
        config.backend.max_attempts = max_attempts;
        config.backend.max_completion_tokens = 64;
        config
    }

    fn client_over(
        script: Vec<Result<CompletionResponse, BackendError>>,
        max_attempts: usize,
    ) -> (CompletionClient, Arc<ScriptedConnection>, Arc<ScriptedTransport>) {
        let connection = Arc::new(ScriptedConnection::new(script));
        let transport = Arc::new(ScriptedTransport::new(connection.clone()));
        let client = CompletionClient::new(transport.clone(), &config(max_attempts));
        (client, connection, transport)
    }

    #[tokio::test]
    async fn first_call_uses_slot_sentinel() {
        let (client, connection, _) =
            client_over(vec![Ok(response("hi", Some(2), true))], 3);

        client.complete("prompt", ConversationId(1)).await.unwrap();

        let request = connection.request(0);
        assert_eq!(request.id_slot, NO_SLOT);
        assert_eq!(request.slot_id, NO_SLOT);
        assert!(request.cache_prompt);
        assert!(!request.use_default_badwordsids);
    }

    #[tokio::test]
    async fn success_refreshes_slot_affinity() {
        let (client, connection, _) = client_over(
            vec![
                Ok(response("first", Some(4), false)),
                Ok(response("second", Some(4), true)),
            ],
            3,
        );

        let first = client.complete("p", ConversationId(1)).await.unwrap();
        // Affinity updated even though the round was not stopped.
        assert!(!first.stopped);
        assert_eq!(client.slot_id(ConversationId(1)).await, Some(4));

        client.complete("p2", ConversationId(1)).await.unwrap();
        assert_eq!(connection.request(1).id_slot, 4);
    }

    #[tokio::test]
    async fn slot_stable_when_response_omits_it() {
        let (client, _, _) = client_over(
            vec![
                Ok(response("a", Some(6), false)),
                Ok(response("b", None, false)),
            ],
            3,
        );

        client.complete("p", ConversationId(9)).await.unwrap();
        client.complete("p", ConversationId(9)).await.unwrap();
        assert_eq!(client.slot_id(ConversationId(9)).await, Some(6));
    }

    #[tokio::test]
    async fn retries_then_succeeds_on_kth_attempt() {
        let (client, connection, _) = client_over(
            vec![
                Err(transport_err()),
                Err(transport_err()),
                Ok(response("made it", Some(1), true)),
            ],
            3,
        );

        let outcome = client.complete("p", ConversationId(1)).await.unwrap();
        assert_eq!(outcome.text, "made it");
        assert!(outcome.stopped);
        assert_eq!(connection.calls(), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_collect_every_error() {
        let (client, connection, _) = client_over(
            vec![
                Err(transport_err()),
                Err(BackendError::Protocol {
                    status: 503,
                    message: "loading model".into(),
                }),
                Err(transport_err()),
            ],
            3,
        );

        let err = client.complete("p", ConversationId(1)).await.unwrap_err();
        assert_eq!(err.attempts.len(), 3);
        assert_eq!(connection.calls(), 3);
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn retries_reuse_the_same_slot() {
        let (client, connection, _) = client_over(
            vec![
                Ok(response("warmup", Some(5), true)),
                Err(transport_err()),
                Ok(response("retried", Some(5), true)),
            ],
            3,
        );

        client.complete("p", ConversationId(1)).await.unwrap();
        client.complete("p2", ConversationId(1)).await.unwrap();

        // Both attempts of the second call carried the established slot.
        assert_eq!(connection.request(1).id_slot, 5);
        assert_eq!(connection.request(2).id_slot, 5);
    }

    #[tokio::test]
    async fn over_cap_completion_still_returned() {
        let long = "word ".repeat(100);
        let (client, _, _) = client_over(vec![Ok(response(&long, None, true))], 1);

        let outcome = client.complete("p", ConversationId(1)).await.unwrap();
        assert!(outcome.token_count > 64);
        assert!(outcome.text.starts_with("word"));
    }

    #[tokio::test]
    async fn release_forces_fresh_connection() {
        let (client, _, transport) = client_over(
            vec![
                Ok(response("a", Some(3), true)),
                Ok(response("b", Some(8), true)),
            ],
            1,
        );

        client.complete("p", ConversationId(1)).await.unwrap();
        assert_eq!(transport.connects(), 1);

        client.release(ConversationId(1)).await;
        assert_eq!(client.slot_id(ConversationId(1)).await, None);

        client.complete("p", ConversationId(1)).await.unwrap();
        assert_eq!(transport.connects(), 2);
        assert_eq!(client.slot_id(ConversationId(1)).await, Some(8));
    }

    #[tokio::test]
    async fn distinct_conversations_get_distinct_entries() {
        let (client, _, transport) = client_over(
            vec![
                Ok(response("a", Some(1), true)),
                Ok(response("b", Some(2), true)),
            ],
            1,
        );

        client.complete("p", ConversationId(1)).await.unwrap();
        client.complete("p", ConversationId(2)).await.unwrap();

        assert_eq!(transport.connects(), 2);
        assert_eq!(client.slot_id(ConversationId(1)).await, Some(1));
        assert_eq!(client.slot_id(ConversationId(2)).await, Some(2));
    }

    #[tokio::test]
    async fn release_all_clears_the_table() {
        let (client, _, _) = client_over(
            vec![
                Ok(response("a", Some(1), true)),
                Ok(response("b", Some(2), true)),
            ],
            1,
        );

        client.complete("p", ConversationId(1)).await.unwrap();
        client.complete("p", ConversationId(2)).await.unwrap();
        client.release_all().await;

        assert_eq!(client.slot_id(ConversationId(1)).await, None);
        assert_eq!(client.slot_id(ConversationId(2)).await, None);
    }
}
