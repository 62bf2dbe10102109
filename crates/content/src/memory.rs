//! In-memory content store — useful for testing and offline runs.

use std::collections::HashMap;

use async_trait::async_trait;
use moot_core::error::ContentError;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::ContentStore;

/// Stores blobs in a map keyed by the SHA-256 of their bytes, giving the
/// same deterministic, idempotent addressing as the real store.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn add(&self, bytes: Vec<u8>) -> Result<String, ContentError> {
        let content_id = hex::encode(Sha256::digest(&bytes));
        self.entries
            .write()
            .await
            .insert(content_id.clone(), bytes);
        Ok(content_id)
    }

    async fn get(&self, content_id: &str) -> Result<Vec<u8>, ContentError> {
        self.entries
            .read()
            .await
            .get(content_id)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(content_id.to_string()))
    }
}
