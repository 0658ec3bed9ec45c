use anyhow::Result;

use threadmem_core::ConversationMemory;

use crate::cli::{CleanupArgs, StatsArgs};
use crate::output::print_json;

pub fn cleanup(engine: &ConversationMemory, args: CleanupArgs) -> Result<()> {
    let report = engine.cleanup_old_conversations(args.days, args.keep, args.dry_run)?;

    if report.dry_run {
        println!("Dry run; nothing was deleted.");
    }
    println!("Threads scanned:     {}", report.threads_scanned);
    println!("Threads cleaned:     {}", report.threads_cleaned);
    println!("Threads skipped:     {}", report.threads_skipped);
    println!("Threads deactivated: {}", report.threads_deactivated);
    println!("Messages deleted:    {}", report.messages_deleted);

    Ok(())
}

pub async fn backfill(engine: &ConversationMemory) -> Result<()> {
    let report = engine.backfill_embeddings().await?;

    println!("Threads processed: {}", report.threads_processed);
    println!("Messages updated:  {}", report.messages_updated);
    if report.errors > 0 {
        println!("Threads failed:    {}", report.errors);
    }

    Ok(())
}

pub fn stats(engine: &ConversationMemory, args: StatsArgs) -> Result<()> {
    let stats = engine.statistics()?;

    if args.json {
        return print_json(&stats);
    }

    println!("Threads:");
    println!("  Total:   {}", stats.total_threads);
    println!("  Active:  {}", stats.active_threads);
    println!("Messages:");
    println!("  Total:       {}", stats.total_messages);
    println!("  Embedded:    {}", stats.embedded_messages);
    println!("  Pending:     {}", stats.pending_embeddings);
    println!("  Human:       {}", stats.human_messages);
    println!("  AI:          {}", stats.ai_messages);
    println!("  System:      {}", stats.system_messages);
    println!("  Last 7 days: {}", stats.recent_messages);
    println!("Checkpoints:");
    println!("  Total:   {}", stats.total_checkpoints);
    println!("Tokens:");
    println!("  Input:   {}", stats.total_input_tokens);
    println!("  Output:  {}", stats.total_output_tokens);

    Ok(())
}
