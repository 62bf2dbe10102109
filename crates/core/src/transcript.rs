//! Published transcript document.
//!
//! The record of a completed conversation: agenda plus chronological
//! messages, serialized to JSON for the content-addressed store. Derived,
//! never persisted locally.

use serde::{Deserialize, Serialize};

use crate::conversation::Conversation;
use crate::error::Error;
use crate::message::ChatMessage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub agenda: String,
    pub messages: Vec<TranscriptMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub author: TranscriptAuthor,

    /// Author of the message this one replied to, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<TranscriptAuthor>,

    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptAuthor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl Transcript {
    /// Build a transcript from a conversation and its messages in
    /// chronological order.
    pub fn new(conversation: &Conversation, messages: &[ChatMessage]) -> Self {
        Self {
            agenda: conversation.agenda.clone(),
            messages: messages
                .iter()
                .map(|m| TranscriptMessage {
                    author: TranscriptAuthor {
                        username: m.author.username.clone(),
                        first_name: m.author.first_name.clone(),
                        last_name: m.author.last_name.clone(),
                    },
                    reply_to: m.reply_to.as_deref().map(|parent| TranscriptAuthor {
                        username: parent.author.username.clone(),
                        first_name: parent.author.first_name.clone(),
                        last_name: parent.author.last_name.clone(),
                    }),
                    text: m.text.clone(),
                })
                .collect(),
        }
    }

    /// Serialize for publishing.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}
