//! Error types for the memory engine.

use thiserror::Error;

/// Errors that can occur in the typed storage and retrieval layers.
///
/// The `ConversationMemory` facade maps these to the documented fallbacks
/// (recency-only retrieval, logged-and-swallowed checkpoint failures);
/// only `add_message` lets a storage error reach the caller.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedding error: {0}")]
    Embedding(#[from] threadmem_ai::AiError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;
