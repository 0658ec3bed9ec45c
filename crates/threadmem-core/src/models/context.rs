//! Context window projection types.

use serde::{Deserialize, Serialize};

use super::message::{Message, Role};

/// Role names the LLM prompt layer expects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContextRole {
    User,
    Assistant,
    System,
}

/// One entry of an assembled context window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextMessage {
    pub role: ContextRole,
    pub content: String,
    pub timestamp: i64,
}

impl ContextMessage {
    /// Project a stored message into the prompt shape. Messages with an
    /// unknown role are dropped (`None`).
    pub fn from_message(message: &Message) -> Option<Self> {
        let role = match message.role {
            Role::Human => ContextRole::User,
            Role::Ai => ContextRole::Assistant,
            Role::System => ContextRole::System,
            Role::Unknown => return None,
        };
        Some(Self {
            role,
            content: message.content.clone(),
            timestamp: message.created_at,
        })
    }
}

/// Aggregate counts and time range for one thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummary {
    pub thread_id: String,
    pub counterpart_id: String,
    pub total_messages: usize,
    pub human_messages: usize,
    pub ai_messages: usize,
    pub first_message_at: Option<i64>,
    pub last_message_at: Option<i64>,
}
