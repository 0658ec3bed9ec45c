//! Storage layer with typed wrappers around threadmem-storage.
//!
//! This module provides type-safe access to the storage layer by wrapping
//! the byte-level APIs from threadmem-storage with Rust types from our
//! models.

pub mod checkpoint;
pub mod message;
pub mod retention;
pub mod thread;

use redb::Database;
use std::sync::Arc;

use threadmem_ai::ModelCache;

use crate::config::MemoryConfig;
use crate::error::Result;

pub use checkpoint::{CheckpointCursor, CheckpointStore, SaveOutcome};
pub use message::MessageStore;
pub use retention::{MAX_CHECKPOINTS_PER_THREAD, RetentionEnforcer};
pub use thread::ThreadStore;

/// Central bundle that initializes all typed stores over one database.
pub struct Stores {
    db: Arc<Database>,
    pub threads: ThreadStore,
    pub checkpoints: CheckpointStore,
    pub messages: MessageStore,
    pub retention: RetentionEnforcer,
}

impl Stores {
    pub fn open(
        db: Arc<Database>,
        cache: Arc<ModelCache>,
        config: &MemoryConfig,
    ) -> Result<Self> {
        let threads = ThreadStore::new(db.clone())?;
        let checkpoints = CheckpointStore::new(db.clone())?;
        let messages = MessageStore::new(db.clone(), cache)?;
        let retention = RetentionEnforcer::new(db.clone(), config.max_checkpoints_per_thread)?;

        Ok(Self {
            db,
            threads,
            checkpoints,
            messages,
            retention,
        })
    }

    /// Get a reference to the underlying database
    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}
