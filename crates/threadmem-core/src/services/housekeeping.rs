//! Scheduled maintenance over the conversation stores: trimming idle
//! threads, backfilling embeddings, and aggregate statistics.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::Role;
use crate::storage::Stores;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const STATS_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub threads_scanned: usize,
    pub threads_cleaned: usize,
    pub threads_skipped: usize,
    pub threads_deactivated: usize,
    pub messages_deleted: usize,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub threads_processed: usize,
    pub messages_updated: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStatistics {
    pub total_threads: usize,
    pub active_threads: usize,
    pub total_messages: usize,
    pub embedded_messages: usize,
    pub pending_embeddings: usize,
    pub human_messages: usize,
    pub ai_messages: usize,
    pub system_messages: usize,
    pub total_checkpoints: usize,
    /// Messages created within the last seven days.
    pub recent_messages: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
}

/// Trim threads that have been idle for more than `days`, keeping the
/// `keep_recent` newest messages in each. Threads touched within the
/// window are left alone. With `dry_run` the report is computed but
/// nothing is deleted.
pub fn cleanup_old_conversations(
    stores: &Stores,
    days: i64,
    keep_recent: usize,
    dry_run: bool,
) -> Result<CleanupReport> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    cleanup_threads_before(stores, retention_cutoff(now_ms, days), keep_recent, dry_run)
}

/// Inner helper: trim threads whose last activity predates `cutoff`.
///
/// Separated from `cleanup_old_conversations` so tests can pin the
/// cutoff instead of depending on the wall clock.
fn cleanup_threads_before(
    stores: &Stores,
    cutoff: Option<i64>,
    keep_recent: usize,
    dry_run: bool,
) -> Result<CleanupReport> {
    let mut report = CleanupReport {
        dry_run,
        ..CleanupReport::default()
    };
    let Some(cutoff) = cutoff else {
        return Ok(report);
    };

    for thread in stores.threads.list_all()? {
        report.threads_scanned += 1;

        if thread.updated_at >= cutoff {
            report.threads_skipped += 1;
            continue;
        }
        let total = stores.messages.count(&thread.id)?;
        if total <= keep_recent {
            report.threads_skipped += 1;
            continue;
        }

        if dry_run {
            report.threads_cleaned += 1;
            report.messages_deleted += total - keep_recent;
            if keep_recent == 0 {
                report.threads_deactivated += 1;
            }
            continue;
        }

        let deleted = stores
            .messages
            .cleanup_old_messages(&thread.id, keep_recent)?;
        report.threads_cleaned += 1;
        report.messages_deleted += deleted;
        debug!(thread_id = %thread.id, deleted, "Trimmed idle thread");

        // A thread trimmed down to nothing is no longer a live conversation.
        if stores.messages.count(&thread.id)? == 0
            && stores.threads.set_active(&thread.id, false)?
        {
            report.threads_deactivated += 1;
        }
    }

    if report.threads_cleaned > 0 && !report.dry_run {
        info!(
            threads = report.threads_cleaned,
            messages = report.messages_deleted,
            "Conversation cleanup finished"
        );
    }

    Ok(report)
}

/// Embed every stored message that is still missing a vector, across
/// all threads. Threads whose backfill fails (no model, storage error)
/// are counted and skipped rather than aborting the sweep.
pub async fn backfill_embeddings(stores: &Stores) -> Result<BackfillReport> {
    let mut report = BackfillReport::default();

    for thread in stores.threads.list_all()? {
        report.threads_processed += 1;
        match stores.messages.update_message_embeddings(&thread.id).await {
            Ok(updated) => report.messages_updated += updated,
            Err(err) => {
                warn!(thread_id = %thread.id, error = %err, "Embedding backfill failed");
                report.errors += 1;
            }
        }
    }

    if report.messages_updated > 0 {
        info!(
            threads = report.threads_processed,
            messages = report.messages_updated,
            "Embedding backfill finished"
        );
    }

    Ok(report)
}

/// Aggregate counters over every thread in the store.
pub fn memory_statistics(stores: &Stores) -> Result<MemoryStatistics> {
    statistics_at(stores, chrono::Utc::now().timestamp_millis())
}

/// Inner helper: compute statistics against a fixed `now`.
fn statistics_at(stores: &Stores, now_ms: i64) -> Result<MemoryStatistics> {
    let mut stats = MemoryStatistics::default();
    let window_start = now_ms - STATS_WINDOW_DAYS * DAY_MS;

    for thread in stores.threads.list_all()? {
        stats.total_threads += 1;
        if thread.active {
            stats.active_threads += 1;
        }
        stats.total_checkpoints += stores.checkpoints.count(&thread.id)?;

        for message in stores.messages.chronological(&thread.id)? {
            stats.total_messages += 1;
            if message.has_embedding() {
                stats.embedded_messages += 1;
            }
            match message.role {
                Role::Human => stats.human_messages += 1,
                Role::Ai => stats.ai_messages += 1,
                Role::System => stats.system_messages += 1,
                Role::Unknown => {}
            }
            if message.created_at >= window_start {
                stats.recent_messages += 1;
            }
            if let Some(usage) = &message.token_usage {
                stats.total_input_tokens += u64::from(usage.input_tokens);
                stats.total_output_tokens += u64::from(usage.output_tokens);
            }
        }
    }

    stats.pending_embeddings = stats.total_messages - stats.embedded_messages;
    Ok(stats)
}

/// Cutoff timestamp for a retention window, or `None` when `days` is
/// zero or negative (retention disabled).
fn retention_cutoff(now_ms: i64, days: i64) -> Option<i64> {
    if days <= 0 {
        None
    } else {
        Some(now_ms - days * DAY_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use threadmem_ai::{AiError, EmbeddingProvider, HashingEmbedder, ModelCache};
    use threadmem_storage::Storage;

    use crate::config::MemoryConfig;
    use crate::models::{Checkpoint, Role, TokenUsage};

    fn hashing_cache() -> Arc<ModelCache> {
        Arc::new(ModelCache::with_loader(
            vec!["hashing".to_string()],
            Arc::new(|_| Ok(Arc::new(HashingEmbedder::default()) as Arc<dyn EmbeddingProvider>)),
        ))
    }

    fn broken_cache() -> Arc<ModelCache> {
        Arc::new(ModelCache::with_loader(
            vec!["missing".to_string()],
            Arc::new(|name| Err(AiError::ModelLoad(name.to_string()))),
        ))
    }

    /// Fails on the first load attempt, succeeds afterwards.
    fn flaky_cache() -> Arc<ModelCache> {
        let calls = AtomicUsize::new(0);
        Arc::new(ModelCache::with_loader(
            vec!["flaky".to_string()],
            Arc::new(move |name| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(AiError::ModelLoad(name.to_string()))
                } else {
                    Ok(Arc::new(HashingEmbedder::default()) as Arc<dyn EmbeddingProvider>)
                }
            }),
        ))
    }

    fn setup(cache: Arc<ModelCache>) -> Stores {
        let storage = Storage::in_memory().unwrap();
        Stores::open(storage.get_db(), cache, &MemoryConfig::default()).unwrap()
    }

    fn backdate_thread(stores: &Stores, thread_id: &str, updated_at: i64) {
        let mut thread = stores.threads.get(thread_id).unwrap().unwrap();
        thread.updated_at = updated_at;
        stores.threads.save(&thread).unwrap();
    }

    async fn add(stores: &Stores, thread_id: &str, role: Role, content: &str) {
        stores
            .messages
            .add_message(thread_id, role, content, None, None)
            .await
            .unwrap();
    }

    #[test]
    fn retention_cutoff_handles_disabled() {
        assert_eq!(retention_cutoff(10_000, 0), None);
        assert_eq!(retention_cutoff(10_000, -3), None);
    }

    #[test]
    fn retention_cutoff_calculates_ms() {
        assert_eq!(
            retention_cutoff(10_000, 1),
            Some(10_000 - 24 * 60 * 60 * 1000)
        );
    }

    #[tokio::test]
    async fn test_cleanup_trims_only_idle_threads() {
        let stores = setup(hashing_cache());

        let idle = stores.threads.get_or_create("bot", "user-1", "agent").unwrap();
        for i in 0..5 {
            // Millisecond timestamps order the index; keep them distinct.
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            add(&stores, &idle.id, Role::Human, &format!("old {i}")).await;
        }
        backdate_thread(&stores, &idle.id, 1_000);

        let fresh = stores.threads.get_or_create("bot", "user-2", "agent").unwrap();
        add(&stores, &fresh.id, Role::Human, "still chatting").await;

        let report = cleanup_threads_before(&stores, Some(2_000), 2, false).unwrap();

        assert_eq!(report.threads_scanned, 2);
        assert_eq!(report.threads_cleaned, 1);
        assert_eq!(report.threads_skipped, 1);
        assert_eq!(report.messages_deleted, 3);
        assert_eq!(stores.messages.count(&idle.id).unwrap(), 2);
        assert_eq!(stores.messages.count(&fresh.id).unwrap(), 1);

        // The newest messages survive.
        let kept = stores.messages.chronological(&idle.id).unwrap();
        assert_eq!(kept[0].content, "old 3");
        assert_eq!(kept[1].content, "old 4");
    }

    #[tokio::test]
    async fn test_cleanup_dry_run_deletes_nothing() {
        let stores = setup(hashing_cache());

        let thread = stores.threads.get_or_create("bot", "user-1", "agent").unwrap();
        for i in 0..5 {
            add(&stores, &thread.id, Role::Human, &format!("msg {i}")).await;
        }
        backdate_thread(&stores, &thread.id, 1_000);

        let report = cleanup_threads_before(&stores, Some(2_000), 2, true).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.threads_cleaned, 1);
        assert_eq!(report.messages_deleted, 3);
        assert_eq!(stores.messages.count(&thread.id).unwrap(), 5);
    }

    #[tokio::test]
    async fn test_cleanup_deactivates_emptied_thread() {
        let stores = setup(hashing_cache());

        let thread = stores.threads.get_or_create("bot", "user-1", "agent").unwrap();
        add(&stores, &thread.id, Role::Human, "only message").await;
        backdate_thread(&stores, &thread.id, 1_000);

        let report = cleanup_threads_before(&stores, Some(2_000), 0, false).unwrap();

        assert_eq!(report.threads_deactivated, 1);
        assert_eq!(stores.messages.count(&thread.id).unwrap(), 0);
        let after = stores.threads.get(&thread.id).unwrap().unwrap();
        assert!(!after.active);
    }

    #[tokio::test]
    async fn test_cleanup_disabled_window_is_a_noop() {
        let stores = setup(hashing_cache());

        let thread = stores.threads.get_or_create("bot", "user-1", "agent").unwrap();
        add(&stores, &thread.id, Role::Human, "hello").await;
        backdate_thread(&stores, &thread.id, 1_000);

        let report = cleanup_threads_before(&stores, None, 0, false).unwrap();

        assert_eq!(report, CleanupReport::default());
        assert_eq!(stores.messages.count(&thread.id).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_backfill_embeds_missing_messages() {
        let cache = flaky_cache();
        let stores = setup(cache.clone());

        let thread = stores.threads.get_or_create("bot", "user-1", "agent").unwrap();
        add(&stores, &thread.id, Role::Human, "first").await;
        add(&stores, &thread.id, Role::Ai, "second").await;
        assert_eq!(stores.messages.embedded(&thread.id).unwrap().len(), 0);

        // The model comes back; the next load succeeds.
        cache.clear();
        let report = backfill_embeddings(&stores).await.unwrap();

        assert_eq!(report.threads_processed, 1);
        assert_eq!(report.messages_updated, 2);
        assert_eq!(report.errors, 0);
        assert_eq!(stores.messages.embedded(&thread.id).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_backfill_counts_failed_threads() {
        let stores = setup(broken_cache());

        let a = stores.threads.get_or_create("bot", "user-1", "agent").unwrap();
        let b = stores.threads.get_or_create("bot", "user-2", "agent").unwrap();
        add(&stores, &a.id, Role::Human, "one").await;
        add(&stores, &b.id, Role::Human, "two").await;

        let report = backfill_embeddings(&stores).await.unwrap();

        assert_eq!(report.threads_processed, 2);
        assert_eq!(report.messages_updated, 0);
        assert_eq!(report.errors, 2);
    }

    #[tokio::test]
    async fn test_statistics_aggregate_counts() {
        let stores = setup(hashing_cache());

        let a = stores.threads.get_or_create("bot", "user-1", "agent").unwrap();
        add(&stores, &a.id, Role::Human, "question").await;
        stores
            .messages
            .add_message(
                &a.id,
                Role::Ai,
                "answer",
                None,
                Some(TokenUsage::new(10, 5)),
            )
            .await
            .unwrap();
        stores
            .checkpoints
            .save(&Checkpoint::new(a.id.clone(), json!({"step": 1})))
            .unwrap();

        let b = stores.threads.get_or_create("bot", "user-2", "agent").unwrap();
        add(&stores, &b.id, Role::System, "prompt").await;
        stores.threads.set_active(&b.id, false).unwrap();

        let now_ms = chrono::Utc::now().timestamp_millis();
        let stats = statistics_at(&stores, now_ms).unwrap();

        assert_eq!(stats.total_threads, 2);
        assert_eq!(stats.active_threads, 1);
        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.embedded_messages, 3);
        assert_eq!(stats.pending_embeddings, 0);
        assert_eq!(stats.human_messages, 1);
        assert_eq!(stats.ai_messages, 1);
        assert_eq!(stats.system_messages, 1);
        assert_eq!(stats.total_checkpoints, 1);
        assert_eq!(stats.recent_messages, 3);
        assert_eq!(stats.total_input_tokens, 10);
        assert_eq!(stats.total_output_tokens, 5);
    }

    #[tokio::test]
    async fn test_statistics_recent_window_excludes_old_messages() {
        let stores = setup(hashing_cache());

        let thread = stores.threads.get_or_create("bot", "user-1", "agent").unwrap();
        add(&stores, &thread.id, Role::Human, "hello").await;

        // Viewed from eight days in the future, nothing is recent.
        let future = chrono::Utc::now().timestamp_millis() + 8 * DAY_MS;
        let stats = statistics_at(&stores, future).unwrap();

        assert_eq!(stats.total_messages, 1);
        assert_eq!(stats.recent_messages, 0);
    }

    #[tokio::test]
    async fn test_statistics_count_pending_embeddings() {
        let stores = setup(broken_cache());

        let thread = stores.threads.get_or_create("bot", "user-1", "agent").unwrap();
        add(&stores, &thread.id, Role::Human, "no vector yet").await;

        let stats = memory_statistics(&stores).unwrap();

        assert_eq!(stats.total_messages, 1);
        assert_eq!(stats.embedded_messages, 0);
        assert_eq!(stats.pending_embeddings, 1);
    }
}
