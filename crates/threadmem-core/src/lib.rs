//! ThreadMem core: typed conversation persistence and retrieval.
//!
//! Layers, bottom to top: serde models, typed stores over the byte-level
//! `threadmem-storage` API, checkpoint retention, the context assembler,
//! housekeeping services, and the [`ConversationMemory`] facade that an
//! agent runtime talks to.

pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
pub mod models;
pub mod services;
pub mod storage;

pub use config::MemoryConfig;
pub use engine::ConversationMemory;
pub use error::{MemoryError, Result};
pub use models::*;
