use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::AiError;
use crate::tools::recall::{ConversationRecall, format_timestamp};
use crate::tools::traits::{Tool, ToolOutput};

/// Matches below this score are noise for recall purposes.
const MIN_SIMILARITY: f32 = 0.6;
const MAX_CONTENT_CHARS: usize = 200;

pub struct MemorySearchTool {
    recall: Option<Arc<dyn ConversationRecall>>,
}

impl MemorySearchTool {
    pub fn new(recall: Option<Arc<dyn ConversationRecall>>) -> Self {
        Self { recall }
    }
}

#[derive(Deserialize)]
struct MemorySearchInput {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

fn truncate_content(content: &str, max_chars: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[async_trait]
impl Tool for MemorySearchTool {
    fn name(&self) -> &str {
        "memory_search"
    }

    fn description(&self) -> &str {
        "Search earlier messages in this conversation by meaning. \
         Use this to recall what was discussed before the recent context window."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Natural language query to search for"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results (default: 10)",
                    "default": 10
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: Value) -> crate::error::Result<ToolOutput> {
        let Some(recall) = &self.recall else {
            return Ok(ToolOutput::success(json!(
                "Conversation memory is not available."
            )));
        };

        let params: MemorySearchInput = match serde_json::from_value(input) {
            Ok(p) => p,
            Err(e) => return Ok(ToolOutput::error(format!("Invalid input: {}", e))),
        };

        let matches = match recall
            .search_messages(&params.query, params.limit, MIN_SIMILARITY)
            .await
        {
            Ok(matches) => matches,
            Err(AiError::NoModelAvailable { .. }) => {
                return Ok(ToolOutput::success(json!(
                    "Conversation memory is not available."
                )));
            }
            Err(e) => return Ok(ToolOutput::error(format!("Search failed: {}", e))),
        };

        if matches.is_empty() {
            return Ok(ToolOutput::success(json!(
                "No relevant conversation history found."
            )));
        }

        let mut output = String::new();
        for (i, m) in matches.iter().enumerate() {
            output.push_str(&format!(
                "{}. [{}] ({}) {}\n",
                i + 1,
                m.role,
                format_timestamp(m.timestamp_ms),
                truncate_content(&m.content, MAX_CONTENT_CHARS)
            ));
        }

        Ok(ToolOutput::success(json!(output)))
    }
}
