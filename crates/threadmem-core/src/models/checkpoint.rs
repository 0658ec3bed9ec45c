//! Checkpoint model for persisting agent execution state.
//!
//! A checkpoint captures everything needed to resume a conversation turn:
//! the serialized channel snapshot, the step counter, pending writes and
//! links to parent checkpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use threadmem_storage::time_utils;

/// Payload format version written into new checkpoints.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Persisted snapshot of per-thread agent state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    /// Unique checkpoint ID. Carries no ordering meaning; ordering comes
    /// from `created_at`.
    pub id: String,

    /// Thread this checkpoint belongs to.
    pub thread_id: String,

    /// Payload format version for forward-compatible decoding.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Serialized channel snapshot (opaque to the engine).
    pub state: Value,

    /// Step counter at checkpoint time.
    #[serde(default)]
    pub step: i64,

    /// Pending write-log captured with the snapshot.
    #[serde(default)]
    pub writes: Value,

    /// Links to parent checkpoints, keyed by namespace.
    #[serde(default)]
    pub parents: HashMap<String, String>,

    /// Creation timestamp in milliseconds since epoch.
    pub created_at: i64,
}

fn default_version() -> u32 {
    CHECKPOINT_VERSION
}

impl Checkpoint {
    /// Create a new checkpoint around a state snapshot.
    pub fn new(thread_id: String, state: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            thread_id,
            version: CHECKPOINT_VERSION,
            state,
            step: 0,
            writes: Value::Null,
            parents: HashMap::new(),
            created_at: time_utils::now_ms(),
        }
    }

    /// Use an externally assigned checkpoint id (orchestrators usually
    /// bring their own).
    #[must_use]
    pub fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_step(mut self, step: i64) -> Self {
        self.step = step;
        self
    }

    #[must_use]
    pub fn with_writes(mut self, writes: Value) -> Self {
        self.writes = writes;
        self
    }

    #[must_use]
    pub fn with_parents(mut self, parents: HashMap<String, String>) -> Self {
        self.parents = parents;
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }
}
