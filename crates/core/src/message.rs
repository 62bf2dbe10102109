//! Message domain types.
//!
//! These are the value objects the prompt builder consumes: a caller
//! (storage, chat adapter, test fixture) supplies ordered [`ChatMessage`]s
//! and everything downstream depends only on this shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a chat (the owning room/group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a conversation within the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message identifier, unique within its conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The author of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Platform-assigned author id.
    pub id: i64,

    /// Handle, preferred for display when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl Author {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
            last_name: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_name(
        mut self,
        first_name: impl Into<String>,
        last_name: Option<String>,
    ) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = last_name;
        self
    }

    /// The name a transcript or prompt labels this author with:
    /// the username when present, otherwise first and last name joined.
    pub fn display_name(&self) -> String {
        if let Some(username) = &self.username {
            return username.clone();
        }
        let mut parts = Vec::new();
        if let Some(first) = &self.first_name {
            parts.push(first.as_str());
        }
        if let Some(last) = &self.last_name {
            parts.push(last.as_str());
        }
        parts.join(" ")
    }
}

/// A single recorded message. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique within the owning conversation.
    pub id: MessageId,

    /// Who sent it.
    pub author: Author,

    /// The message this one replies to, resolved one level deep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Box<ChatMessage>>,

    /// The text content.
    pub text: String,

    /// When it was sent.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(
        id: MessageId,
        author: Author,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author,
            reply_to: None,
            text: text.into(),
            timestamp,
        }
    }

    pub fn with_reply_to(mut self, parent: ChatMessage) -> Self {
        self.reply_to = Some(Box::new(parent));
        self
    }

    /// The sender label used when rendering this message into a prompt or
    /// transcript: the author's display name, annotated with the replied-to
    /// author when this message is a reply.
    pub fn sender_label(&self) -> String {
        match &self.reply_to {
            Some(parent) => format!(
                "{} (in reply to {})",
                self.author.display_name(),
                parent.author.display_name()
            ),
            None => self.author.display_name(),
        }
    }
}
