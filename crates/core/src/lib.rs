//! # Moot Core
//!
//! Domain types and error definitions for the moot conversation engine.
//! This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Value objects and the error taxonomy live here; behavior lives in the
//! outer crates (backend, storage, agent). All crates depend inward on core,
//! which keeps the dependency graph acyclic and makes every subsystem
//! testable against plain data.

pub mod conversation;
pub mod error;
pub mod message;
pub mod token;
pub mod transcript;

// Re-export key types at crate root for ergonomics
pub use conversation::{Conversation, ConversationState, Summary, SummaryId, SummaryState};
pub use error::{
    BackendError, BudgetError, CompletionError, ContentError, Error, Result, StateError,
    StorageError,
};
pub use message::{Author, ChatId, ChatMessage, ConversationId, MessageId};
pub use token::count_tokens;
pub use transcript::Transcript;
