//! The `ConversationMemory` facade.
//!
//! One handle that wires the typed stores, the context assembler, the
//! embedding model cache and the retention enforcer together. Read paths
//! used inside a live turn never surface errors to the caller: a broken
//! store degrades to `None`/empty with a log line, because losing a reply
//! over a failed checkpoint load is worse than replying without history.
//! Writes that would silently lose content (`add_message`) still propagate.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use threadmem_ai::{
    AiError, ConversationRecall, ConversationSummaryTool, MemorySearchTool, ModelCache,
    RecallSummary, RecalledMessage,
};
use threadmem_storage::Storage;

use crate::config::MemoryConfig;
use crate::error::{MemoryError, Result};
use crate::memory::ContextAssembler;
use crate::models::{
    Checkpoint, ContextMessage, ConversationSummary, Message, Role, Thread, TokenUsage,
};
use crate::services::housekeeping::{self, BackfillReport, CleanupReport, MemoryStatistics};
use crate::storage::{CheckpointCursor, SaveOutcome, Stores};

pub struct ConversationMemory {
    stores: Stores,
    assembler: ContextAssembler,
    cache: Arc<ModelCache>,
    config: MemoryConfig,
}

impl ConversationMemory {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>, config: MemoryConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| MemoryError::Config(e.to_string()))?;
        Self::with_storage(Storage::new(path)?, config)
    }

    /// Fully in-memory instance; state is lost on drop.
    pub fn in_memory(config: MemoryConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| MemoryError::Config(e.to_string()))?;
        Self::with_storage(Storage::in_memory()?, config)
    }

    fn with_storage(storage: Storage, config: MemoryConfig) -> Result<Self> {
        let cache = Arc::new(ModelCache::new(config.embedding_candidates.clone()));
        let stores = Stores::open(storage.get_db(), cache.clone(), &config)?;
        let assembler = ContextAssembler::new(
            stores.threads.clone(),
            stores.messages.clone(),
            cache.clone(),
            config.similarity_threshold,
        );

        info!(
            max_checkpoints = config.max_checkpoints_per_thread,
            max_context = config.max_context_messages,
            "Conversation memory ready"
        );

        Ok(Self {
            stores,
            assembler,
            cache,
            config,
        })
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Name of the embedding model currently serving requests, if one
    /// has been loaded.
    pub fn active_embedding_model(&self) -> Option<String> {
        self.cache.active_model()
    }

    // ============== Thread Operations ==============

    pub fn get_or_create_thread(
        &self,
        owner_id: &str,
        counterpart_id: &str,
        agent_id: &str,
    ) -> Result<Thread> {
        self.stores
            .threads
            .get_or_create(owner_id, counterpart_id, agent_id)
    }

    pub fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        self.stores.threads.get(thread_id)
    }

    pub fn set_active(&self, thread_id: &str, active: bool) -> Result<bool> {
        self.stores.threads.set_active(thread_id, active)
    }

    /// Remove a thread and everything keyed to it.
    pub fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.stores.messages.delete_thread(thread_id)?;
        self.stores.checkpoints.delete_thread(thread_id)?;
        self.stores.threads.delete(thread_id)?;
        Ok(())
    }

    // ============== Checkpoint Operations ==============

    /// Persist a checkpoint, trimming old ones when a new row was inserted.
    ///
    /// Failures are logged and swallowed; a turn must not die because its
    /// state snapshot could not be written.
    pub fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Option<SaveOutcome> {
        let outcome = match self.stores.checkpoints.save(checkpoint) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    thread_id = %checkpoint.thread_id,
                    checkpoint_id = %checkpoint.id,
                    error = %err,
                    "Failed to save checkpoint"
                );
                return None;
            }
        };

        // A state snapshot counts as activity for the idle-cleanup gate.
        if let Err(err) = self.stores.threads.touch(&checkpoint.thread_id) {
            warn!(
                thread_id = %checkpoint.thread_id,
                error = %err,
                "Failed to refresh thread activity"
            );
        }

        // Overwrites do not grow the thread; only inserts can breach the cap.
        if outcome == SaveOutcome::Inserted {
            if let Err(err) = self.stores.retention.enforce(&checkpoint.thread_id) {
                warn!(
                    thread_id = %checkpoint.thread_id,
                    error = %err,
                    "Checkpoint retention failed"
                );
            }
        }

        Some(outcome)
    }

    pub fn latest_checkpoint(&self, thread_id: &str) -> Option<Checkpoint> {
        match self.stores.checkpoints.latest(thread_id) {
            Ok(found) => found,
            Err(err) => {
                warn!(thread_id = %thread_id, error = %err, "Failed to load latest checkpoint");
                None
            }
        }
    }

    pub fn checkpoint_by_id(&self, thread_id: &str, checkpoint_id: &str) -> Option<Checkpoint> {
        match self.stores.checkpoints.by_id(thread_id, checkpoint_id) {
            Ok(found) => found,
            Err(err) => {
                warn!(
                    thread_id = %thread_id,
                    checkpoint_id = %checkpoint_id,
                    error = %err,
                    "Failed to load checkpoint"
                );
                None
            }
        }
    }

    pub fn list_checkpoints(
        &self,
        thread_id: &str,
        before: Option<CheckpointCursor>,
        limit: Option<usize>,
    ) -> Vec<Checkpoint> {
        match self.stores.checkpoints.list(thread_id, before, limit) {
            Ok(page) => page,
            Err(err) => {
                warn!(thread_id = %thread_id, error = %err, "Failed to list checkpoints");
                Vec::new()
            }
        }
    }

    // ============== Message Operations ==============

    /// Record one conversation turn. Unlike the checkpoint paths this
    /// propagates storage failures: dropping a message silently would
    /// corrupt the history the rest of the engine serves.
    pub async fn add_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
        metadata: Option<Value>,
        token_usage: Option<TokenUsage>,
    ) -> Result<Message> {
        self.stores
            .messages
            .add_message(thread_id, role, content, metadata, token_usage)
            .await
    }

    /// Prompt context with the configured window size, both halves enabled.
    pub async fn context_messages(&self, thread_id: &str, query: &str) -> Vec<ContextMessage> {
        self.assembler
            .context_messages(thread_id, query, true, true, self.config.max_context_messages)
            .await
    }

    pub async fn context_messages_with(
        &self,
        thread_id: &str,
        query: &str,
        include_recent: bool,
        include_semantic: bool,
        max_messages: usize,
    ) -> Vec<ContextMessage> {
        self.assembler
            .context_messages(thread_id, query, include_recent, include_semantic, max_messages)
            .await
    }

    /// Semantically closest messages at the configured threshold, most
    /// recent history when retrieval is degraded.
    pub async fn relevant_messages(
        &self,
        thread_id: &str,
        query: &str,
        limit: usize,
    ) -> Vec<Message> {
        self.assembler
            .relevant_messages(thread_id, query, limit, self.config.similarity_threshold)
            .await
    }

    pub fn conversation_summary(&self, thread_id: &str) -> Result<ConversationSummary> {
        self.assembler.conversation_summary(thread_id)
    }

    // ============== Housekeeping Operations ==============

    /// Trim idle threads. `days`/`keep_recent` default to the configured
    /// values when not given.
    pub fn cleanup_old_conversations(
        &self,
        days: Option<i64>,
        keep_recent: Option<usize>,
        dry_run: bool,
    ) -> Result<CleanupReport> {
        housekeeping::cleanup_old_conversations(
            &self.stores,
            days.unwrap_or(self.config.cleanup_after_days),
            keep_recent.unwrap_or(self.config.keep_recent_messages),
            dry_run,
        )
    }

    pub async fn backfill_embeddings(&self) -> Result<BackfillReport> {
        housekeeping::backfill_embeddings(&self.stores).await
    }

    pub fn statistics(&self) -> Result<MemoryStatistics> {
        housekeeping::memory_statistics(&self.stores)
    }

    // ============== Agent Tool Operations ==============

    /// Recall backend bound to one thread, for handing to the tools.
    pub fn recall_for_thread(&self, thread_id: &str) -> Arc<dyn ConversationRecall> {
        Arc::new(ThreadRecall {
            assembler: self.assembler.clone(),
            thread_id: thread_id.to_string(),
        })
    }

    pub fn memory_search_tool(&self, thread_id: &str) -> MemorySearchTool {
        MemorySearchTool::new(Some(self.recall_for_thread(thread_id)))
    }

    pub fn conversation_summary_tool(&self, thread_id: &str) -> ConversationSummaryTool {
        ConversationSummaryTool::new(Some(self.recall_for_thread(thread_id)))
    }
}

/// [`ConversationRecall`] over one thread's history.
struct ThreadRecall {
    assembler: ContextAssembler,
    thread_id: String,
}

/// `NoModelAvailable` must stay visible through the tool seam so the tools
/// can answer with their degraded text; everything else is opaque to them.
fn recall_error(err: MemoryError) -> AiError {
    match err {
        MemoryError::Embedding(inner) => inner,
        other => AiError::Tool(other.to_string()),
    }
}

#[async_trait]
impl ConversationRecall for ThreadRecall {
    async fn search_messages(
        &self,
        query: &str,
        limit: usize,
        min_similarity: f32,
    ) -> threadmem_ai::Result<Vec<RecalledMessage>> {
        let scored = self
            .assembler
            .search_with_scores(&self.thread_id, query, limit, min_similarity)
            .await
            .map_err(recall_error)?;

        Ok(scored
            .into_iter()
            .map(|(message, similarity)| RecalledMessage {
                role: message.role.label().to_string(),
                content: message.content,
                timestamp_ms: message.created_at,
                similarity,
            })
            .collect())
    }

    async fn summarize(&self) -> threadmem_ai::Result<RecallSummary> {
        let summary = self
            .assembler
            .conversation_summary(&self.thread_id)
            .map_err(recall_error)?;

        Ok(RecallSummary {
            message_count: summary.total_messages,
            human_messages: summary.human_messages,
            ai_messages: summary.ai_messages,
            first_message_ms: summary.first_message_at,
            last_message_ms: summary.last_message_at,
        })
    }
}
