//! Typed thread storage wrapper.
//!
//! Wraps the byte-level API from threadmem-storage with the `Thread` model
//! and the get-or-create semantics the engine relies on.

use redb::Database;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::Thread;

#[derive(Clone)]
pub struct ThreadStore {
    inner: threadmem_storage::ThreadStorage,
}

impl ThreadStore {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            inner: threadmem_storage::ThreadStorage::new(db)?,
        })
    }

    /// Store a thread, overwriting any existing row with the same id.
    pub fn save(&self, thread: &Thread) -> Result<()> {
        let data = serde_json::to_vec(thread)?;
        self.inner.put_raw(&thread.id, &data)?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Thread>> {
        match self.inner.get_raw(id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Resolve the thread for an (owner, counterpart) pair, creating it on
    /// first interaction. An existing thread is returned as stored; its
    /// `agent_id` is not rewritten.
    pub fn get_or_create(
        &self,
        owner_id: &str,
        counterpart_id: &str,
        agent_id: &str,
    ) -> Result<Thread> {
        let id = Thread::derive_id(owner_id, counterpart_id);
        if let Some(existing) = self.get(&id)? {
            return Ok(existing);
        }

        let thread = Thread::new(
            owner_id.to_string(),
            counterpart_id.to_string(),
            agent_id.to_string(),
        );
        self.save(&thread)?;
        debug!(thread_id = %thread.id, owner = owner_id, "Created conversation thread");
        Ok(thread)
    }

    /// Refresh a thread's `updated_at`. Missing ids are ignored.
    pub fn touch(&self, id: &str) -> Result<()> {
        if let Some(thread) = self.get(id)? {
            self.save(&thread.touch())?;
        }
        Ok(())
    }

    /// Flip the active flag. Returns false when the thread does not exist.
    pub fn set_active(&self, id: &str, active: bool) -> Result<bool> {
        let Some(mut thread) = self.get(id)? else {
            return Ok(false);
        };
        thread.active = active;
        self.save(&thread.touch())?;
        Ok(true)
    }

    pub fn list_all(&self) -> Result<Vec<Thread>> {
        let mut threads = Vec::new();
        for (_, bytes) in self.inner.list_raw()? {
            threads.push(serde_json::from_slice(&bytes)?);
        }
        Ok(threads)
    }

    pub fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.inner.exists(id)?)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.inner.count()?)
    }

    /// Remove the thread row itself. Checkpoints and messages are handled
    /// by their own stores.
    pub fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.inner.delete(id)?)
    }
}
