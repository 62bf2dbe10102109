//! Multi-round response streaming.
//!
//! The backend caps each generation at `max_completion_tokens`, so one call
//! rarely yields a full reply. A [`ResponseStream`] drives rounds until the
//! backend signals a stop: each pull completes on the accumulated prompt and
//! folds the generated text back in for the next round.

use moot_backend::CompletionClient;
use moot_config::AppConfig;
use moot_core::error::{CompletionError, Error};
use moot_core::message::{ChatMessage, ConversationId};
use tracing::{debug, warn};

use crate::persona::PromptKind;
use crate::prompt::PromptBuilder;

/// One round of generated text.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub text: String,

    /// True when the backend reported completion this round.
    pub stopped: bool,
}

/// A lazy, finite sequence of completion rounds for one conversation.
///
/// Pull-based: nothing happens until [`next`](ResponseStream::next) is
/// called, and dropping the stream abandons the drive without further
/// backend calls. Not restartable; build a fresh stream for a fresh reply.
///
/// The stream ends on the first of: a stop signal, the configured round
/// cap, or an error (errors propagate immediately, with no retrying beyond
/// what the client already did).
pub struct ResponseStream<'a> {
    client: &'a CompletionClient,
    conversation_id: ConversationId,
    prompt: String,
    rounds_remaining: usize,
    finished: bool,
}

impl<'a> ResponseStream<'a> {
    fn new(
        client: &'a CompletionClient,
        conversation_id: ConversationId,
        prompt: String,
        max_rounds: usize,
    ) -> Self {
        Self {
            client,
            conversation_id,
            prompt,
            rounds_remaining: max_rounds,
            finished: false,
        }
    }

    /// Pull the next chunk, or `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Result<StreamChunk, CompletionError>> {
        if self.finished || self.rounds_remaining == 0 {
            return None;
        }
        self.rounds_remaining -= 1;

        match self
            .client
            .complete(&self.prompt, self.conversation_id)
            .await
        {
            Ok(outcome) => {
                self.prompt.push_str(&outcome.text);
                if outcome.stopped {
                    self.finished = true;
                } else if self.rounds_remaining == 0 {
                    warn!(
                        conversation = %self.conversation_id,
                        "Round cap reached without a stop signal"
                    );
                }
                Some(Ok(StreamChunk {
                    text: outcome.text,
                    stopped: outcome.stopped,
                }))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Front door to the completion pipeline: assembles a budgeted prompt and
/// opens a [`ResponseStream`] over it.
pub struct Responder {
    client: CompletionClient,
    builder: PromptBuilder,
    max_prompt_tokens: usize,
    max_rounds: usize,
}

impl Responder {
    pub fn new(client: CompletionClient, config: &AppConfig) -> Self {
        Self {
            client,
            builder: PromptBuilder::new(config),
            max_prompt_tokens: config.backend.max_prompt_tokens,
            max_rounds: config.backend.max_rounds,
        }
    }

    /// Open a response stream over `history` (newest first) speaking as the
    /// given persona kind.
    pub fn respond(
        &self,
        history: &[ChatMessage],
        kind: PromptKind,
        conversation_id: ConversationId,
    ) -> Result<ResponseStream<'_>, Error> {
        let built = self
            .builder
            .build(history, kind, self.max_prompt_tokens)?;
        debug!(
            conversation = %conversation_id,
            used_tokens = built.used_tokens,
            truncated = built.truncated,
            "Prompt assembled"
        );
        Ok(ResponseStream::new(
            &self.client,
            conversation_id,
            built.text,
            self.max_rounds,
        ))
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }
}
