//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables for retention, context assembly and cleanup.
///
/// Every field has a serde default, so a partial config file (or `{}`)
/// deserializes to the same values as [`MemoryConfig::default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Checkpoints retained per thread after enforcement.
    #[serde(default = "default_max_checkpoints")]
    pub max_checkpoints_per_thread: usize,

    /// Upper bound on messages in an assembled context window.
    #[serde(default = "default_max_context_messages")]
    pub max_context_messages: usize,

    /// Minimum cosine similarity for internal semantic retrieval.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Threads untouched for this many days are eligible for cleanup.
    #[serde(default = "default_cleanup_after_days")]
    pub cleanup_after_days: i64,

    /// Messages kept per thread when cleanup trims it.
    #[serde(default = "default_keep_recent_messages")]
    pub keep_recent_messages: usize,

    /// Embedding models tried in order until one loads.
    #[serde(default = "default_embedding_candidates")]
    pub embedding_candidates: Vec<String>,
}

fn default_max_checkpoints() -> usize {
    20
}

fn default_max_context_messages() -> usize {
    20
}

fn default_similarity_threshold() -> f32 {
    0.7
}

fn default_cleanup_after_days() -> i64 {
    30
}

fn default_keep_recent_messages() -> usize {
    50
}

fn default_embedding_candidates() -> Vec<String> {
    threadmem_ai::default_candidates()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_checkpoints_per_thread: default_max_checkpoints(),
            max_context_messages: default_max_context_messages(),
            similarity_threshold: default_similarity_threshold(),
            cleanup_after_days: default_cleanup_after_days(),
            keep_recent_messages: default_keep_recent_messages(),
            embedding_candidates: default_embedding_candidates(),
        }
    }
}

impl MemoryConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_checkpoints_per_thread == 0 {
            anyhow::bail!("max_checkpoints_per_thread must be at least 1");
        }
        if self.max_context_messages == 0 {
            anyhow::bail!("max_context_messages must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            anyhow::bail!(
                "similarity_threshold must be within [0.0, 1.0], got {}",
                self.similarity_threshold
            );
        }
        if self.cleanup_after_days < 0 {
            anyhow::bail!("cleanup_after_days must not be negative");
        }
        if self.embedding_candidates.is_empty() {
            anyhow::bail!("embedding_candidates must name at least one model");
        }
        Ok(())
    }
}
