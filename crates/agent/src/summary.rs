//! Summary lifecycle: create, run, mark.
//!
//! A summary is opened `pending` with the conversation's message count
//! snapshotted, driven through the backend, then marked terminal exactly
//! once. The mark happens even when streaming fails, with whatever partial
//! text accumulated, so no summary is left `pending` indefinitely.

use moot_core::conversation::{Summary, SummaryState};
use moot_core::error::{Error, Result};
use moot_core::message::ConversationId;
use moot_storage::Store;
use tracing::{info, warn};

use crate::persona::PromptKind;
use crate::stream::Responder;

/// A marked summary, plus the streaming failure when the drive did not
/// finish cleanly.
#[derive(Debug)]
pub struct SummaryOutcome {
    pub summary: Summary,
    pub error: Option<Error>,
}

/// Drives summaries end to end against the store and the backend.
pub struct SummaryJob<'a> {
    store: &'a Store,
    responder: &'a Responder,
}

impl<'a> SummaryJob<'a> {
    pub fn new(store: &'a Store, responder: &'a Responder) -> Self {
        Self { store, responder }
    }

    /// Open a pending summary snapshotting the conversation's current
    /// message count.
    pub async fn create(&self, conversation_id: ConversationId) -> Result<Summary> {
        self.store.create_summary(conversation_id).await
    }

    /// Stream a summary over the snapshotted window, feeding each chunk to
    /// `on_chunk` as it arrives.
    ///
    /// Returns the accumulated text plus the error that cut the stream
    /// short, when one did. Partial text survives a failure.
    pub async fn run<F>(&self, summary: &Summary, mut on_chunk: F) -> (String, Option<Error>)
    where
        F: FnMut(&str),
    {
        let history = match self
            .store
            .recent_messages(summary.conversation_id, summary.message_count)
            .await
        {
            Ok(history) => history,
            Err(err) => return (String::new(), Some(err)),
        };

        let mut stream = match self.responder.respond(
            &history,
            PromptKind::Summary,
            summary.conversation_id,
        ) {
            Ok(stream) => stream,
            Err(err) => return (String::new(), Some(err)),
        };

        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => {
                    on_chunk(&chunk.text);
                    text.push_str(&chunk.text);
                }
                Err(err) => return (text, Some(err.into())),
            }
        }
        (text, None)
    }

    /// Persist the final text and a terminal state.
    pub async fn mark(
        &self,
        summary: &Summary,
        text: Option<&str>,
        state: SummaryState,
    ) -> Result<Summary> {
        self.store.mark_summary(summary.id, text, state).await
    }

    /// The whole drive: create, run, mark.
    ///
    /// A streaming failure does not fail the call; the summary is marked
    /// `failed` with any partial text and the error rides along in the
    /// outcome. Only create/mark failures, where no terminal summary
    /// exists, surface as `Err`.
    pub async fn summarize<F>(
        &self,
        conversation_id: ConversationId,
        on_chunk: F,
    ) -> Result<SummaryOutcome>
    where
        F: FnMut(&str),
    {
        let summary = self.create(conversation_id).await?;
        let (text, error) = self.run(&summary, on_chunk).await;

        let state = match &error {
            None => SummaryState::Complete,
            Some(err) => {
                warn!(
                    conversation = %conversation_id,
                    summary = %summary.id,
                    error = %err,
                    "Summary stream failed, marking failed with partial text"
                );
                SummaryState::Failed
            }
        };
        let recorded = if text.is_empty() {
            None
        } else {
            Some(text.as_str())
        };
        let summary = self.mark(&summary, recorded, state).await?;
        info!(summary = %summary.id, state = %summary.state, "Summary marked");
        Ok(SummaryOutcome { summary, error })
    }
}
