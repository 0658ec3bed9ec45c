//! Typed message storage wrapper.
//!
//! `add_message` is the single write path for conversation turns: it embeds
//! the content when a model is available and degrades to a null embedding
//! when it is not. Only a storage failure reaches the caller, because losing
//! message content must be visible; losing a vector is not.

use redb::Database;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use threadmem_ai::ModelCache;

use crate::error::Result;
use crate::models::{Message, Role, TokenUsage};
use crate::storage::thread::ThreadStore;

#[derive(Clone)]
pub struct MessageStore {
    inner: threadmem_storage::MessageStorage,
    threads: ThreadStore,
    cache: Arc<ModelCache>,
}

impl MessageStore {
    pub fn new(db: Arc<Database>, cache: Arc<ModelCache>) -> Result<Self> {
        Ok(Self {
            inner: threadmem_storage::MessageStorage::new(db.clone())?,
            threads: ThreadStore::new(db)?,
            cache,
        })
    }

    /// Persist one conversation turn, embedding it if possible.
    pub async fn add_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
        metadata: Option<Value>,
        token_usage: Option<TokenUsage>,
    ) -> Result<Message> {
        let mut message = Message::new(thread_id.to_string(), role, content.to_string());
        if let Some(metadata) = metadata {
            message = message.with_metadata(metadata);
        }
        if let Some(usage) = token_usage {
            message = message.with_token_usage(usage);
        }

        match self.cache.get() {
            Ok(provider) => match provider.embed(content).await {
                Ok(embedding) => {
                    message = message.with_embedding(embedding, provider.model_name());
                }
                Err(e) => {
                    warn!(thread_id, error = %e, "Embedding failed; storing message without vector");
                }
            },
            Err(_) => {
                debug!(thread_id, "No embedding model; storing message without vector");
            }
        }

        let data = serde_json::to_vec(&message)?;
        self.inner
            .put(&message.id, thread_id, message.created_at, &data)?;
        self.threads.touch(thread_id)?;
        Ok(message)
    }

    /// Newest messages first.
    pub fn recent(&self, thread_id: &str, limit: usize) -> Result<Vec<Message>> {
        let mut out = Vec::new();
        for bytes in self.inner.list_recent(thread_id, limit)? {
            out.push(serde_json::from_slice(&bytes)?);
        }
        Ok(out)
    }

    /// Full history in chronological order.
    pub fn chronological(&self, thread_id: &str) -> Result<Vec<Message>> {
        let mut out = Vec::new();
        for bytes in self.inner.list(thread_id)? {
            out.push(serde_json::from_slice(&bytes)?);
        }
        Ok(out)
    }

    /// Messages carrying an embedding, newest first.
    pub fn embedded(&self, thread_id: &str) -> Result<Vec<Message>> {
        let mut out: Vec<Message> = Vec::new();
        for bytes in self.inner.list_recent(thread_id, usize::MAX)? {
            let message: Message = serde_json::from_slice(&bytes)?;
            if message.has_embedding() {
                out.push(message);
            }
        }
        Ok(out)
    }

    pub fn count(&self, thread_id: &str) -> Result<usize> {
        Ok(self.inner.count(thread_id)?)
    }

    /// Trim the thread to its `keep_recent` newest messages in one batch.
    pub fn cleanup_old_messages(&self, thread_id: &str, keep_recent: usize) -> Result<usize> {
        Ok(self.inner.delete_oldest_keeping(thread_id, keep_recent)?)
    }

    /// Backfill embeddings for messages stored without one.
    ///
    /// Requires a loaded model; with none available the call fails up front.
    /// Individual encode failures are logged and skipped, and every success
    /// is written back immediately so progress survives a crash.
    pub async fn update_message_embeddings(&self, thread_id: &str) -> Result<usize> {
        let provider = self.cache.get()?;

        let mut updated = 0usize;
        for message in self.chronological(thread_id)? {
            if message.has_embedding() {
                continue;
            }
            match provider.embed(&message.content).await {
                Ok(embedding) => {
                    let message = message.with_embedding(embedding, provider.model_name());
                    let data = serde_json::to_vec(&message)?;
                    if self.inner.update_payload(&message.id, &data)? {
                        updated += 1;
                    }
                }
                Err(e) => {
                    warn!(
                        thread_id,
                        message_id = %message.id,
                        error = %e,
                        "Backfill embedding failed; skipping message"
                    );
                }
            }
        }

        if updated > 0 {
            debug!(thread_id, updated, "Backfilled message embeddings");
        }
        Ok(updated)
    }

    /// Delete every message of a thread. The thread row stays.
    pub fn delete_thread(&self, thread_id: &str) -> Result<usize> {
        Ok(self.inner.delete_thread(thread_id)?)
    }
}
