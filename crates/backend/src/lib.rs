//! Completion backend client for Moot.
//!
//! Speaks the llama.cpp server completion protocol over HTTP. The
//! `Transport`/`Connection` seam keeps the client testable without a live
//! server; `CompletionClient` adds retries and per-conversation slot
//! affinity on top.

pub mod client;
pub mod transport;
pub mod wire;

pub use client::{CompletionClient, CompletionOutcome};
pub use transport::{Connection, HttpTransport, Transport};
pub use wire::{CompletionRequest, CompletionResponse, NO_SLOT};
