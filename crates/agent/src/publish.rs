//! Transcript publishing to the content-addressed store.
//!
//! Publishing renders a `complete` conversation's full transcript, adds it
//! to the content store, and records the returned id on the conversation.
//! Publish-once is observed end to end: a conversation already holding a
//! content id returns it unchanged without touching the content store.

use moot_content::ContentStore;
use moot_core::conversation::ConversationState;
use moot_core::error::{Result, StateError};
use moot_core::message::ConversationId;
use moot_core::transcript::Transcript;
use moot_storage::Store;
use tracing::{debug, info};

pub struct Publisher<'a> {
    store: &'a Store,
    content: &'a dyn ContentStore,
}

impl<'a> Publisher<'a> {
    pub fn new(store: &'a Store, content: &'a dyn ContentStore) -> Self {
        Self { store, content }
    }

    /// Publish the conversation's transcript, returning its content id.
    pub async fn publish(&self, conversation_id: ConversationId) -> Result<String> {
        let conversation = self.store.get(conversation_id).await?;
        if let Some(existing) = &conversation.content_id {
            debug!(
                conversation = %conversation_id,
                content = %existing,
                "Transcript already published"
            );
            return Ok(existing.clone());
        }
        if conversation.state != ConversationState::Complete {
            return Err(StateError::Conflict {
                conversation_id: conversation_id.0,
                reason: format!("cannot publish a {} conversation", conversation.state),
            }
            .into());
        }

        let count = self.store.message_count(conversation_id).await?;
        let mut messages = self.store.recent_messages(conversation_id, count).await?;
        messages.reverse();

        let transcript = Transcript::new(&conversation, &messages);
        let content_id = self.content.add(transcript.to_bytes()?).await?;
        self.store
            .set_content_id(conversation_id, &content_id)
            .await?;
        info!(
            conversation = %conversation_id,
            content = %content_id,
            messages = count,
            "Transcript published"
        );
        Ok(content_id)
    }
}
