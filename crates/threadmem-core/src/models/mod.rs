pub mod checkpoint;
pub mod context;
pub mod message;
pub mod thread;

pub use checkpoint::{CHECKPOINT_VERSION, Checkpoint};
pub use context::{ContextMessage, ContextRole, ConversationSummary};
pub use message::{Message, Role, TokenUsage};
pub use thread::Thread;
