//! SQLite persistence for Moot: conversations, messages, authors, and
//! summaries, plus the conversation state machine.

pub mod store;

pub use store::Store;
