//! ThreadMem Storage - Low-level storage abstraction layer
//!
//! This crate provides the persistence layer for ThreadMem, using redb as
//! the embedded database. It exposes byte-level APIs so it stays free of the
//! core crate's model types; higher-level typed wrappers live in
//! threadmem-core.
//!
//! # Architecture
//!
//! Each entity type gets a primary key-value table keyed by id plus, where
//! per-thread chronological access is needed, a composite-key time index
//! (see [`keys`]). Payloads are opaque bytes; serialization is the typed
//! layer's concern.
//!
//! # Tables
//!
//! - `conversation_threads` - Thread rows
//! - `checkpoints` / `checkpoint_time_idx` - Agent state snapshots
//! - `messages` / `message_time_idx` - Conversation turns

pub mod checkpoint;
pub mod keys;
pub mod message;
pub mod thread;
pub mod time_utils;

use anyhow::Result;
use redb::Database;
use std::path::Path;
use std::sync::Arc;

pub use checkpoint::{CheckpointStorage, SaveOutcome};
pub use message::MessageStorage;
pub use thread::ThreadStorage;

/// Central storage manager that initializes all storage subsystems
pub struct Storage {
    db: Arc<Database>,
    pub threads: ThreadStorage,
    pub checkpoints: CheckpointStorage,
    pub messages: MessageStorage,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will create the database file if it doesn't exist and initialize
    /// all required tables.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);
        Self::with_db(db)
    }

    /// Create a storage instance backed by memory only. State is lost on
    /// drop; intended for tests and ephemeral tooling.
    pub fn in_memory() -> Result<Self> {
        let db = Arc::new(
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?,
        );
        Self::with_db(db)
    }

    fn with_db(db: Arc<Database>) -> Result<Self> {
        let threads = ThreadStorage::new(db.clone())?;
        let checkpoints = CheckpointStorage::new(db.clone())?;
        let messages = MessageStorage::new(db.clone())?;

        Ok(Self {
            db,
            threads,
            checkpoints,
            messages,
        })
    }

    /// Get a reference to the underlying database
    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}
