//! Error types for the moot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all moot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Backend errors ---
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    // --- Completion retry exhaustion ---
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    // --- Prompt budget ---
    #[error("Budget error: {0}")]
    Budget(#[from] BudgetError),

    // --- Conversation lifecycle ---
    #[error("State error: {0}")]
    State(#[from] StateError),

    // --- Content store errors ---
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    // --- Persistence errors ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A single failed attempt against the completion backend. Retryable.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Backend returned {status}: {message}")]
    Protocol { status: u16, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Malformed backend response: {0}")]
    Decode(String),
}

/// All retry attempts for one completion call failed.
///
/// Carries every attempt's individual error so callers can see the
/// full failure history, not just the last one.
#[derive(Debug, Error)]
#[error("Completion failed after {} attempt(s): {}", attempts.len(), summarize(attempts))]
pub struct CompletionError {
    pub attempts: Vec<BackendError>,
}

fn summarize(attempts: &[BackendError]) -> String {
    attempts
        .iter()
        .enumerate()
        .map(|(i, e)| format!("[{}] {e}", i + 1))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Error)]
pub enum BudgetError {
    #[error("Prompt scaffolding alone needs {required} tokens, limit is {limit}")]
    PromptBudgetExceeded { required: usize, limit: usize },
}

/// Conversation lifecycle violations. Recoverable, user-facing.
#[derive(Debug, Clone, Error)]
pub enum StateError {
    #[error("Illegal transition for conversation {conversation_id}: {reason}")]
    Conflict {
        conversation_id: i64,
        reason: String,
    },

    /// `active` is reachable only through create and enter; `pending` only
    /// through summary creation.
    #[error("State '{0}' is not a valid transition target")]
    InvalidTarget(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(i64),

    #[error("Summary not found: {0}")]
    SummaryNotFound(i64),
}

#[derive(Debug, Clone, Error)]
pub enum ContentError {
    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Content store request failed: {0}")]
    Store(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),
}
