//! Typed checkpoint storage wrapper.

use redb::Database;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::Checkpoint;
use crate::storage::thread::ThreadStore;

pub use threadmem_storage::SaveOutcome;

/// Pagination bound for [`CheckpointStore::list`].
///
/// An id cursor is resolved to that checkpoint's creation timestamp; a
/// timestamp cursor is used as-is. Both are exclusive.
#[derive(Debug, Clone)]
pub enum CheckpointCursor {
    Id(String),
    Timestamp(i64),
}

#[derive(Clone)]
pub struct CheckpointStore {
    inner: threadmem_storage::CheckpointStorage,
    threads: ThreadStore,
}

impl CheckpointStore {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            inner: threadmem_storage::CheckpointStorage::new(db.clone())?,
            threads: ThreadStore::new(db)?,
        })
    }

    /// Upsert a checkpoint by id and refresh the thread's `updated_at`.
    ///
    /// An update keeps the stored row's `created_at` and `thread_id`: the
    /// checkpoint's position in the thread's chronological order is fixed at
    /// insert time, and an id cannot migrate to another thread.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<SaveOutcome> {
        let mut to_store = checkpoint.clone();
        if let Some(bytes) = self.inner.load(&checkpoint.id)? {
            let existing: Checkpoint = serde_json::from_slice(&bytes)?;
            to_store.created_at = existing.created_at;
            to_store.thread_id = existing.thread_id;
        }

        let data = serde_json::to_vec(&to_store)?;
        let outcome = self
            .inner
            .save(&to_store.id, &to_store.thread_id, to_store.created_at, &data)?;
        self.threads.touch(&to_store.thread_id)?;
        Ok(outcome)
    }

    /// Most recently created checkpoint of a thread.
    pub fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        match self.inner.latest(thread_id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Fetch a checkpoint by id, verifying it belongs to the thread.
    pub fn by_id(&self, thread_id: &str, id: &str) -> Result<Option<Checkpoint>> {
        match self.inner.load(id)? {
            Some(bytes) => {
                let checkpoint: Checkpoint = serde_json::from_slice(&bytes)?;
                if checkpoint.thread_id == thread_id {
                    Ok(Some(checkpoint))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// List checkpoints newest-first, optionally bounded by a cursor.
    ///
    /// A cursor id that no longer resolves (trimmed by retention) yields an
    /// empty page, which terminates pagination cleanly instead of looping
    /// back to the newest entries.
    pub fn list(
        &self,
        thread_id: &str,
        before: Option<CheckpointCursor>,
        limit: Option<usize>,
    ) -> Result<Vec<Checkpoint>> {
        let before_ms = match before {
            None => None,
            Some(CheckpointCursor::Timestamp(ms)) => Some(ms),
            Some(CheckpointCursor::Id(id)) => match self.by_id(thread_id, &id)? {
                Some(checkpoint) => Some(checkpoint.created_at),
                None => {
                    debug!(thread_id, cursor = %id, "Cursor checkpoint no longer exists");
                    return Ok(Vec::new());
                }
            },
        };

        let mut out = Vec::new();
        for bytes in self.inner.list(thread_id, before_ms, limit)? {
            out.push(serde_json::from_slice(&bytes)?);
        }
        Ok(out)
    }

    pub fn count(&self, thread_id: &str) -> Result<usize> {
        Ok(self.inner.count(thread_id)?)
    }

    /// Remove all checkpoints of a thread, then the thread row itself.
    pub fn delete_thread(&self, thread_id: &str) -> Result<usize> {
        let deleted = self.inner.delete_thread(thread_id)?;
        self.threads.delete(thread_id)?;
        Ok(deleted)
    }
}
