//! Conversation recall seam.
//!
//! Tools in this crate never touch storage directly; they go through
//! [`ConversationRecall`], which the engine crate implements over a bound
//! conversation thread.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A past message surfaced by semantic search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalledMessage {
    /// Display-ready role label ("Human", "AI", ...).
    pub role: String,
    pub content: String,
    pub timestamp_ms: i64,
    pub similarity: f32,
}

/// Counts and time range for one conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallSummary {
    pub message_count: usize,
    pub human_messages: usize,
    pub ai_messages: usize,
    pub first_message_ms: Option<i64>,
    pub last_message_ms: Option<i64>,
}

/// Backing store for the conversation tools, bound to a single thread.
///
/// `search_messages` returns `Err(AiError::NoModelAvailable)` when no
/// embedding model could be loaded; tools translate that into a degraded
/// text response rather than a hard failure.
#[async_trait]
pub trait ConversationRecall: Send + Sync {
    async fn search_messages(
        &self,
        query: &str,
        limit: usize,
        min_similarity: f32,
    ) -> Result<Vec<RecalledMessage>>;

    async fn summarize(&self) -> Result<RecallSummary>;
}

/// Render an epoch-millisecond timestamp for tool output.
pub(crate) fn format_timestamp(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string())
}
