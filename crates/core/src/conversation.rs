//! Conversation and summary lifecycle types.
//!
//! States are tagged enums with one canonical string form each; guards and
//! persistence compare enum values only, never loose strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::{ChatId, ConversationId};

/// Raised when a persisted state tag does not match any known variant.
#[derive(Debug, Clone, Error)]
#[error("Unknown state tag: {0}")]
pub struct UnknownStateError(pub String);

/// Lifecycle state of a [`Conversation`].
///
/// `active` is the initial state and the only state in which messages are
/// recorded against the conversation. At most one conversation per chat is
/// `active` at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    Active,
    Inactive,
    Complete,
    Cancelled,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled)
    }
}

impl std::str::FromStr for ConversationState {
    type Err = UnknownStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "complete" => Ok(Self::Complete),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStateError(other.to_string())),
        }
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deliberation thread owned by one chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,

    /// The chat this conversation belongs to.
    pub chat_id: ChatId,

    /// Free-text statement of what the conversation is about.
    pub agenda: String,

    pub state: ConversationState,

    /// Content-addressed id of the published transcript, set at most once,
    /// only while `complete`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identifier for a [`Summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryId(pub i64);

impl std::fmt::Display for SummaryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a [`Summary`]: created `pending`, marked exactly once
/// with a terminal `complete` or `failed`, never reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryState {
    Pending,
    Complete,
    Failed,
}

impl SummaryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl std::str::FromStr for SummaryState {
    type Err = UnknownStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "complete" => Ok(Self::Complete),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownStateError(other.to_string())),
        }
    }
}

impl std::fmt::Display for SummaryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time summary of one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: SummaryId,

    pub conversation_id: ConversationId,

    /// How many messages the conversation held when summarization began.
    /// Fixes the coverage window so regeneration is reproducible.
    pub message_count: i64,

    pub state: SummaryState,

    /// The summary text; present after a terminal mark, possibly partial
    /// when the mark recorded a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
