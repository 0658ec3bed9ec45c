//! Error types for the AI module

use thiserror::Error;

/// AI module error types
#[derive(Error, Debug)]
pub enum AiError {
    /// Every candidate in the fallback chain failed to load. Callers treat
    /// this as "semantic features disabled" until the cache is cleared;
    /// it is deliberately distinct from a single failed encode call.
    #[error("no embedding model available (tried: {tried:?})")]
    NoModelAvailable { tried: Vec<String> },

    #[error("model load failed: {0}")]
    ModelLoad(String),

    #[error("unsupported embedding model: {0}")]
    UnsupportedModel(String),

    #[error("embedding failed: {0}")]
    Encode(String),

    #[error("tool error: {0}")]
    Tool(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for AI operations
pub type Result<T> = std::result::Result<T, AiError>;
