//! Content-addressed storage for published transcripts.
//!
//! `HttpStore` speaks the IPFS HTTP API (multipart add against the API
//! port, reads through the gateway). `MemoryStore` derives ids by hashing
//! and backs tests and offline runs.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use moot_core::error::ContentError;

pub use http::HttpStore;
pub use memory::MemoryStore;

/// A store addressing immutable blobs by a deterministic content id.
///
/// `add` is idempotent: the same bytes always map to the same id.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn add(&self, bytes: Vec<u8>) -> Result<String, ContentError>;

    async fn get(&self, content_id: &str) -> Result<Vec<u8>, ContentError>;
}
