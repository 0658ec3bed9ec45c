use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "threadmem")]
#[command(version, about = "ThreadMem - conversation memory maintenance")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (defaults to the platform data directory)
    #[arg(long, global = true, env = "THREADMEM_DB_PATH")]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Trim messages from threads idle beyond the retention window
    Cleanup(CleanupArgs),

    /// Embed stored messages that are still missing vectors
    Backfill,

    /// Show aggregate statistics over the whole store
    Stats(StatsArgs),
}

#[derive(Args)]
pub struct CleanupArgs {
    /// Idle window in days (defaults to the configured value)
    #[arg(long)]
    pub days: Option<i64>,

    /// Messages to keep per trimmed thread (defaults to the configured value)
    #[arg(long)]
    pub keep: Option<usize>,

    /// Report what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct StatsArgs {
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}
