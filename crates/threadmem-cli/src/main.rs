mod cli;
mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use cli::{Cli, Commands};
use threadmem_core::{ConversationMemory, MemoryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep stdout clean for command output; logs go to stderr.
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    debug!(path = %db_path.display(), "Opening database");

    let engine = ConversationMemory::open(&db_path, MemoryConfig::default())?;

    match cli.command {
        Commands::Cleanup(args) => commands::maintenance::cleanup(&engine, args),
        Commands::Backfill => commands::maintenance::backfill(&engine).await,
        Commands::Stats(args) => commands::maintenance::stats(&engine, args),
    }
}

fn default_db_path() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!("no data directory available on this platform"))?
        .join("threadmem");
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("threadmem.db"))
}
