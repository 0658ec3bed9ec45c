//! Message model for conversation history.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use threadmem_storage::time_utils;

/// Who produced a message.
///
/// Unknown role strings survive deserialization (as [`Role::Unknown`]) so
/// that payloads written by newer versions still load; context mapping
/// drops them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
    System,
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Display label for tool output.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Human => "Human",
            Role::Ai => "AI",
            Role::System => "System",
            Role::Unknown => "Unknown",
        }
    }
}

/// Token accounting attached to `ai` messages.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
            model_name: None,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }
}

/// Single persisted conversation message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique identifier for this message
    pub id: String,

    /// Thread this message belongs to
    pub thread_id: String,

    pub role: Role,

    /// The message text
    pub content: String,

    /// Vector embedding for semantic search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Model used to generate the embedding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,

    /// Embedding dimension (for validation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_dim: Option<usize>,

    /// Free-form metadata supplied by the orchestrator
    #[serde(default)]
    pub metadata: Value,

    /// Token accounting, meaningful for `ai` messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,

    /// Unix timestamp in milliseconds when this message was created
    pub created_at: i64,
}

impl Message {
    /// Create a new message with a generated ID.
    pub fn new(thread_id: String, role: Role, content: String) -> Self {
        Self {
            id: format!("msg-{}", uuid::Uuid::new_v4()),
            thread_id,
            role,
            content,
            embedding: None,
            embedding_model: None,
            embedding_dim: None,
            metadata: Value::Null,
            token_usage: None,
            created_at: time_utils::now_ms(),
        }
    }

    /// Attach an embedding with its provenance.
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>, model: impl Into<String>) -> Self {
        self.embedding_dim = Some(embedding.len());
        self.embedding_model = Some(model.into());
        self.embedding = Some(embedding);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_token_usage(mut self, usage: TokenUsage) -> Self {
        self.token_usage = Some(usage);
        self
    }

    /// Use a specific ID (for deserialization/testing)
    #[must_use]
    pub fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Human).unwrap(), "\"human\"");
        assert_eq!(serde_json::to_string(&Role::Ai).unwrap(), "\"ai\"");
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
    }

    #[test]
    fn test_unknown_role_survives_deserialization() {
        let role: Role = serde_json::from_str("\"moderator\"").unwrap();
        assert_eq!(role, Role::Unknown);
    }

    #[test]
    fn test_with_embedding_records_provenance() {
        let msg = Message::new("thread-1".into(), Role::Human, "hi".into())
            .with_embedding(vec![0.1, 0.2, 0.3], "hashing");
        assert!(msg.has_embedding());
        assert_eq!(msg.embedding_dim, Some(3));
        assert_eq!(msg.embedding_model.as_deref(), Some("hashing"));
    }

    #[test]
    fn test_token_usage_totals() {
        let usage = TokenUsage::new(120, 30).with_model("gpt-4o-mini");
        assert_eq!(usage.total_tokens, 150);
        assert_eq!(usage.model_name.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_payload_without_optional_fields_loads() {
        let raw = serde_json::json!({
            "id": "msg-1",
            "thread_id": "thread-1",
            "role": "human",
            "content": "hello",
            "created_at": 1000
        });
        let msg: Message = serde_json::from_value(raw).unwrap();
        assert!(!msg.has_embedding());
        assert_eq!(msg.metadata, Value::Null);
        assert!(msg.token_usage.is_none());
    }
}
