//! Agent tools over conversation memory.
//!
//! Tools implement the `Tool` trait and reach history through the
//! [`ConversationRecall`] seam, so they stay usable even when the embedding
//! model or the store is degraded.

mod memory_search;
mod recall;
mod summary;
mod traits;

pub use memory_search::MemorySearchTool;
pub use recall::{ConversationRecall, RecallSummary, RecalledMessage};
pub use summary::ConversationSummaryTool;
pub use traits::{Tool, ToolOutput, ToolSchema};
