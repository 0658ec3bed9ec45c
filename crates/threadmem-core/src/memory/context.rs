//! Context window assembly.
//!
//! Builds the per-turn prompt context from two sources: the newest messages
//! (recency) and semantically similar older ones (relevance). Retrieval
//! degrades instead of failing: with no embedding model, no usable query
//! vector or a broken store, callers still get the most recent history.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use threadmem_ai::ModelCache;

use crate::error::Result;
use crate::memory::similarity::cosine_similarity;
use crate::models::{ContextMessage, ConversationSummary, Message, Role};
use crate::storage::{MessageStore, ThreadStore};

#[derive(Clone)]
pub struct ContextAssembler {
    threads: ThreadStore,
    messages: MessageStore,
    cache: Arc<ModelCache>,
    similarity_threshold: f32,
}

impl ContextAssembler {
    pub fn new(
        threads: ThreadStore,
        messages: MessageStore,
        cache: Arc<ModelCache>,
        similarity_threshold: f32,
    ) -> Self {
        Self {
            threads,
            messages,
            cache,
            similarity_threshold,
        }
    }

    /// Rank a thread's embedded messages against a query.
    ///
    /// Fallible core of semantic retrieval: a missing model surfaces as
    /// `AiError::NoModelAvailable`, encode and storage failures as their
    /// own errors. Messages whose stored vector has a different dimension
    /// than the query vector are skipped.
    pub async fn search_with_scores(
        &self,
        thread_id: &str,
        query: &str,
        limit: usize,
        min_similarity: f32,
    ) -> Result<Vec<(Message, f32)>> {
        let provider = self.cache.get()?;
        let query_embedding = provider.embed(query).await?;

        let mut scored = Vec::new();
        for message in self.messages.embedded(thread_id)? {
            let Some(embedding) = message.embedding.as_deref() else {
                continue;
            };
            if embedding.len() != query_embedding.len() {
                debug!(
                    message_id = %message.id,
                    stored = embedding.len(),
                    expected = query_embedding.len(),
                    "Skipping message with mismatched embedding dimension"
                );
                continue;
            }

            let similarity = cosine_similarity(&query_embedding, embedding);
            if similarity >= min_similarity {
                scored.push((message, similarity));
            }
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);
        Ok(scored)
    }

    /// Semantically relevant messages, or the most recent ones when
    /// retrieval cannot run. This method never fails; a thread with a
    /// broken store yields an empty list.
    pub async fn relevant_messages(
        &self,
        thread_id: &str,
        query: &str,
        limit: usize,
        min_similarity: f32,
    ) -> Vec<Message> {
        match self
            .search_with_scores(thread_id, query, limit, min_similarity)
            .await
        {
            Ok(scored) => scored.into_iter().map(|(message, _)| message).collect(),
            Err(e) => {
                debug!(thread_id, error = %e, "Semantic retrieval unavailable; using recency");
                self.messages.recent(thread_id, limit).unwrap_or_else(|e| {
                    warn!(thread_id, error = %e, "Recency fallback failed");
                    Vec::new()
                })
            }
        }
    }

    /// Assemble the context window for a new turn.
    ///
    /// The recent half holds the newest `max_messages/2` messages in
    /// chronological order; the semantic half appends up to `max_messages/2`
    /// relevant older messages, deduplicated by content against everything
    /// already included. When the combined window overflows, the front is
    /// cut, so semantic entries survive truncation.
    pub async fn context_messages(
        &self,
        thread_id: &str,
        query: &str,
        include_recent: bool,
        include_semantic: bool,
        max_messages: usize,
    ) -> Vec<ContextMessage> {
        let half = max_messages / 2;
        let mut included: Vec<ContextMessage> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        if include_recent {
            let mut recent = self.messages.recent(thread_id, half).unwrap_or_else(|e| {
                warn!(thread_id, error = %e, "Failed to load recent messages");
                Vec::new()
            });
            recent.reverse();
            for message in &recent {
                if let Some(context) = ContextMessage::from_message(message) {
                    seen.insert(context.content.clone());
                    included.push(context);
                }
            }
        }

        if include_semantic && !query.is_empty() {
            let relevant = self
                .relevant_messages(thread_id, query, half, self.similarity_threshold)
                .await;
            for message in &relevant {
                if seen.contains(&message.content) {
                    continue;
                }
                if let Some(context) = ContextMessage::from_message(message) {
                    seen.insert(context.content.clone());
                    included.push(context);
                }
            }
        }

        if included.len() > max_messages {
            let cut = included.len() - max_messages;
            included.drain(..cut);
        }
        included
    }

    /// Counts and time range over one thread's full history.
    pub fn conversation_summary(&self, thread_id: &str) -> Result<ConversationSummary> {
        let counterpart_id = self
            .threads
            .get(thread_id)?
            .map(|thread| thread.counterpart_id)
            .unwrap_or_default();

        let history = self.messages.chronological(thread_id)?;
        let human_messages = history.iter().filter(|m| m.role == Role::Human).count();
        let ai_messages = history.iter().filter(|m| m.role == Role::Ai).count();

        Ok(ConversationSummary {
            thread_id: thread_id.to_string(),
            counterpart_id,
            total_messages: history.len(),
            human_messages,
            ai_messages,
            first_message_at: history.first().map(|m| m.created_at),
            last_message_at: history.last().map(|m| m.created_at),
        })
    }
}
