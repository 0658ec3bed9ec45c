//! ThreadMem AI - embedding providers and conversation tools
//!
//! This crate provides:
//! - Embedding provider trait with hashing, local (fastembed) and OpenAI backends
//! - Process-wide model cache with a sticky fallback chain
//! - Agent tools for searching and summarizing conversation history

pub mod embedding;
pub mod error;
pub mod tools;

// Re-export commonly used types
pub use embedding::{
    DEFAULT_EMBEDDING_DIM, EmbeddingConfig, EmbeddingProvider, HashingEmbedder, ModelCache,
    OpenAiEmbedding, ProviderLoader, default_candidates, load_by_name,
};
pub use error::{AiError, Result};
pub use tools::{
    ConversationRecall, ConversationSummaryTool, MemorySearchTool, RecallSummary,
    RecalledMessage, Tool, ToolOutput, ToolSchema,
};
