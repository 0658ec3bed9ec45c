//! End-to-end flows through the public engine API, against a real
//! database file.

use serde_json::json;
use tempfile::TempDir;

use threadmem_ai::Tool;
use threadmem_core::models::{Checkpoint, ContextRole, Role, TokenUsage};
use threadmem_core::storage::CheckpointCursor;
use threadmem_core::{ConversationMemory, MemoryConfig};

fn hashing_config() -> MemoryConfig {
    MemoryConfig {
        embedding_candidates: vec!["hashing".to_string()],
        ..MemoryConfig::default()
    }
}

#[tokio::test]
async fn full_turn_cycle_survives_reopen() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let db_path = dir.path().join("memory.redb");

    let thread_id = {
        let engine = ConversationMemory::open(&db_path, hashing_config())
            .expect("failed to open engine");
        let thread = engine
            .get_or_create_thread("assistant-bot", "user-42", "support-agent")
            .expect("failed to create thread");

        engine
            .add_message(&thread.id, Role::Human, "What is the refund policy?", None, None)
            .await
            .expect("failed to add human message");

        let context = engine.context_messages(&thread.id, "refund policy").await;
        assert_eq!(context.len(), 1);
        assert_eq!(context[0].role, ContextRole::User);

        engine
            .add_message(
                &thread.id,
                Role::Ai,
                "Refunds are accepted within 30 days.",
                None,
                Some(TokenUsage::new(52, 18).with_model("gpt-4o-mini")),
            )
            .await
            .expect("failed to add ai message");

        let checkpoint = Checkpoint::new(thread.id.clone(), json!({"turn": 1})).with_step(1);
        assert!(engine.save_checkpoint(&checkpoint).is_some());

        thread.id
    };

    // Everything must still be there after the process "restarts".
    let engine =
        ConversationMemory::open(&db_path, hashing_config()).expect("failed to reopen engine");

    let thread = engine
        .get_thread(&thread_id)
        .expect("failed to load thread")
        .expect("thread missing after reopen");
    assert_eq!(thread.counterpart_id, "user-42");

    let checkpoint = engine
        .latest_checkpoint(&thread_id)
        .expect("checkpoint missing after reopen");
    assert_eq!(checkpoint.step, 1);
    assert_eq!(checkpoint.state, json!({"turn": 1}));

    let summary = engine
        .conversation_summary(&thread_id)
        .expect("failed to summarize");
    assert_eq!(summary.total_messages, 2);
    assert_eq!(summary.human_messages, 1);
    assert_eq!(summary.ai_messages, 1);
}

#[tokio::test]
async fn checkpoint_cap_drops_the_oldest() {
    let engine = ConversationMemory::in_memory(hashing_config()).expect("failed to open engine");
    let thread = engine
        .get_or_create_thread("bot", "user-1", "agent")
        .expect("failed to create thread");

    for step in 0..21 {
        let checkpoint = Checkpoint::new(thread.id.clone(), json!({"step": step}))
            .with_step(step)
            .with_created_at(1_000 + step);
        engine.save_checkpoint(&checkpoint);
    }

    let page = engine.list_checkpoints(&thread.id, None, None);
    assert_eq!(page.len(), 20);
    // Newest first; step 0 was trimmed away.
    assert_eq!(page.first().map(|c| c.step), Some(20));
    assert_eq!(page.last().map(|c| c.step), Some(1));
}

#[tokio::test]
async fn checkpoint_pagination_walks_backwards() {
    let engine = ConversationMemory::in_memory(hashing_config()).expect("failed to open engine");
    let thread = engine
        .get_or_create_thread("bot", "user-1", "agent")
        .expect("failed to create thread");

    for step in 0..5 {
        let checkpoint = Checkpoint::new(thread.id.clone(), json!({"step": step}))
            .with_step(step)
            .with_created_at(1_000 + step);
        engine.save_checkpoint(&checkpoint);
    }

    let first_page = engine.list_checkpoints(&thread.id, None, Some(2));
    assert_eq!(
        first_page.iter().map(|c| c.step).collect::<Vec<_>>(),
        vec![4, 3]
    );

    let cursor = CheckpointCursor::Id(first_page.last().unwrap().id.clone());
    let second_page = engine.list_checkpoints(&thread.id, Some(cursor), Some(2));
    assert_eq!(
        second_page.iter().map(|c| c.step).collect::<Vec<_>>(),
        vec![2, 1]
    );

    let cursor = CheckpointCursor::Id(second_page.last().unwrap().id.clone());
    let last_page = engine.list_checkpoints(&thread.id, Some(cursor), Some(2));
    assert_eq!(
        last_page.iter().map(|c| c.step).collect::<Vec<_>>(),
        vec![0]
    );
}

#[tokio::test]
async fn context_pulls_old_matches_past_the_recency_window() {
    let engine = ConversationMemory::in_memory(hashing_config()).expect("failed to open engine");
    let thread = engine
        .get_or_create_thread("bot", "user-1", "agent")
        .expect("failed to create thread");

    engine
        .add_message(&thread.id, Role::Human, "my order number is 4821", None, None)
        .await
        .expect("failed to add message");
    for i in 0..29 {
        // Millisecond timestamps order the history; keep them distinct.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        engine
            .add_message(&thread.id, Role::Human, &format!("small talk {i}"), None, None)
            .await
            .expect("failed to add message");
    }

    // 30 messages stored; the window holds 10 recent plus semantic matches.
    let context = engine
        .context_messages(&thread.id, "my order number is 4821")
        .await;

    assert_eq!(context.len(), 11);
    assert_eq!(context[0].content, "small talk 19");
    assert_eq!(context[9].content, "small talk 28");
    assert_eq!(context[10].content, "my order number is 4821");
}

#[tokio::test]
async fn tools_run_against_a_live_thread() {
    let engine = ConversationMemory::in_memory(hashing_config()).expect("failed to open engine");
    let thread = engine
        .get_or_create_thread("bot", "user-1", "agent")
        .expect("failed to create thread");

    engine
        .add_message(&thread.id, Role::Human, "the deploy window is Tuesday", None, None)
        .await
        .expect("failed to add message");
    engine
        .add_message(&thread.id, Role::Ai, "Noted, Tuesday it is.", None, None)
        .await
        .expect("failed to add message");

    let search = engine.memory_search_tool(&thread.id);
    let out = search
        .execute(json!({"query": "the deploy window is Tuesday"}))
        .await
        .expect("tool execution failed");
    assert!(out.success);
    assert!(
        out.result
            .as_str()
            .expect("tool output should be text")
            .contains("the deploy window is Tuesday")
    );

    let summary = engine.conversation_summary_tool(&thread.id);
    let out = summary.execute(json!({})).await.expect("tool execution failed");
    assert!(out.success);
    let text = out.result.as_str().expect("tool output should be text");
    assert!(text.starts_with("2 messages (1 from the user, 1 from the assistant)"));
}

#[tokio::test]
async fn missing_model_degrades_to_recent_history() {
    let engine = ConversationMemory::in_memory(MemoryConfig {
        embedding_candidates: vec!["nonexistent-model".to_string()],
        ..MemoryConfig::default()
    })
    .expect("failed to open engine");
    let thread = engine
        .get_or_create_thread("bot", "user-1", "agent")
        .expect("failed to create thread");

    engine
        .add_message(&thread.id, Role::Human, "first", None, None)
        .await
        .expect("failed to add message");
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    engine
        .add_message(&thread.id, Role::Ai, "second", None, None)
        .await
        .expect("failed to add message");

    // No embeddings anywhere, yet the turn still gets its context.
    let context = engine.context_messages(&thread.id, "anything").await;
    assert_eq!(context.len(), 2);
    assert_eq!(context[0].content, "first");
    assert_eq!(context[1].content, "second");

    let out = engine
        .memory_search_tool(&thread.id)
        .execute(json!({"query": "anything"}))
        .await
        .expect("tool execution failed");
    assert!(out.success);
    assert_eq!(out.result, json!("Conversation memory is not available."));
}
