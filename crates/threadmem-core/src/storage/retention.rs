//! Checkpoint retention enforcement.

use redb::Database;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;

/// Default checkpoint cap per thread.
pub const MAX_CHECKPOINTS_PER_THREAD: usize = 20;

/// Trims a thread's checkpoint history back under the cap.
///
/// Called synchronously right after each successful insert. Count and
/// delete run in separate transactions, so two concurrent writers can both
/// observe an over-cap count and together trim more than strictly needed;
/// the bound holds eventually and the newest checkpoints are never victims.
#[derive(Clone)]
pub struct RetentionEnforcer {
    checkpoints: threadmem_storage::CheckpointStorage,
    max_per_thread: usize,
}

impl RetentionEnforcer {
    pub fn new(db: Arc<Database>, max_per_thread: usize) -> Result<Self> {
        Ok(Self {
            checkpoints: threadmem_storage::CheckpointStorage::new(db)?,
            max_per_thread,
        })
    }

    pub fn max_per_thread(&self) -> usize {
        self.max_per_thread
    }

    /// Delete the oldest checkpoints above the cap. Returns how many were
    /// removed.
    pub fn enforce(&self, thread_id: &str) -> Result<usize> {
        let count = self.checkpoints.count(thread_id)?;
        if count <= self.max_per_thread {
            return Ok(0);
        }

        let excess = count - self.max_per_thread;
        let deleted = self.checkpoints.delete_oldest(thread_id, excess)?;
        debug!(
            thread_id,
            deleted,
            cap = self.max_per_thread,
            "Enforced checkpoint retention"
        );
        Ok(deleted)
    }
}
