use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::tools::recall::{ConversationRecall, format_timestamp};
use crate::tools::traits::{Tool, ToolOutput};

pub struct ConversationSummaryTool {
    recall: Option<Arc<dyn ConversationRecall>>,
}

impl ConversationSummaryTool {
    pub fn new(recall: Option<Arc<dyn ConversationRecall>>) -> Self {
        Self { recall }
    }
}

#[async_trait]
impl Tool for ConversationSummaryTool {
    fn name(&self) -> &str {
        "conversation_summary"
    }

    fn description(&self) -> &str {
        "Get message counts and the time span of this conversation. \
         Use this to gauge how much history exists before searching it."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _input: Value) -> crate::error::Result<ToolOutput> {
        let Some(recall) = &self.recall else {
            return Ok(ToolOutput::success(json!(
                "Conversation memory is not available."
            )));
        };

        let summary = match recall.summarize().await {
            Ok(s) => s,
            Err(e) => return Ok(ToolOutput::error(format!("Summary failed: {}", e))),
        };

        if summary.message_count == 0 {
            return Ok(ToolOutput::success(json!("No conversation history yet.")));
        }

        let mut text = format!(
            "{} messages ({} from the user, {} from the assistant)",
            summary.message_count, summary.human_messages, summary.ai_messages
        );
        if let (Some(first), Some(last)) =
            (summary.first_message_ms, summary.last_message_ms)
        {
            text.push_str(&format!(
                ", from {} to {}",
                format_timestamp(first),
                format_timestamp(last)
            ));
        }

        Ok(ToolOutput::success(json!(text)))
    }
}
