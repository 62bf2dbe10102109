//! Wire types for the llama.cpp-style `/completion` endpoint.
//!
//! The slot id travels under two field names (`id_slot` is current,
//! `slot_id` is legacy); both are written on requests and read on
//! responses so either backend version round-trips correctly.

use serde::{Deserialize, Serialize};

/// Slot sentinel: no server-side cached context yet.
pub const NO_SLOT: i64 = -1;

/// One completion request.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub prompt: String,

    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,

    /// Generation cap.
    pub n_predict: usize,

    /// Current slot id, duplicated for version tolerance.
    pub id_slot: i64,
    pub slot_id: i64,

    /// Disabled samplers, pinned so server defaults cannot drift.
    pub typical_p: f32,
    pub tfs_z: f32,

    pub stop: Vec<String>,

    /// Always true: the server keeps the evaluated prompt in the slot so
    /// the next round only pays for the appended tail.
    pub cache_prompt: bool,

    pub use_default_badwordsids: bool,
}

/// One completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub stopped_eos: bool,

    #[serde(default)]
    pub stopped_word: bool,

    #[serde(default)]
    pub id_slot: Option<i64>,

    #[serde(default)]
    pub slot_id: Option<i64>,
}

impl CompletionResponse {
    /// Whether the backend considers this generation finished.
    pub fn stopped(&self) -> bool {
        self.stopped_eos || self.stopped_word
    }

    /// The slot id the server assigned, preferring the current field name.
    pub fn slot(&self) -> Option<i64> {
        self.id_slot.or(self.slot_id)
    }
}
