//! Workspace Tracker - watch a directory and stream its file list
//!
//! Every coalesced update is written to stdout as one JSON line.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use workspace_tracker::observability::init_tracing;
use workspace_tracker::tracker::JsonLinesSink;
use workspace_tracker::watcher::{FileWatcher, WalkLister};
use workspace_tracker::{Result, TrackerConfig, WorkspaceTracker};

/// Workspace Tracker - stream a debounced workspace file list
#[derive(Parser, Debug)]
#[command(name = "workspace-tracker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workspace root to track
    #[arg(env = "WORKSPACE_TRACKER_ROOT", default_value = ".")]
    root: std::path::PathBuf,

    /// Debounce window in milliseconds
    #[arg(long, env = "WORKSPACE_TRACKER_DEBOUNCE_MS", default_value = "100")]
    debounce_ms: u64,

    /// Maximum number of entries read by the initial listing
    #[arg(long, env = "WORKSPACE_TRACKER_MAX_ENTRIES", default_value = "1000")]
    max_entries: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "WORKSPACE_TRACKER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "WORKSPACE_TRACKER_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_json);

    tracing::info!(
        "Workspace Tracker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = TrackerConfig {
        root: Some(cli.root),
        debounce: Duration::from_millis(cli.debounce_ms),
        max_initial_entries: cli.max_entries,
        log_level: cli.log_level,
        log_json: cli.log_json,
    };

    tracing::debug!(?config, "Configuration loaded");

    config.validate()?;

    let sink = JsonLinesSink::new(std::io::stdout())?;
    let tracker = WorkspaceTracker::new(&config, Arc::new(sink));
    let root = tracker
        .root()
        .map(|root| root.path().to_path_buf())
        .ok_or_else(|| workspace_tracker::Error::config("root is required"))?;

    let watcher = FileWatcher::new(&root)?;
    tracker.initialize(Arc::new(WalkLister), watcher).await;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    tracker.dispose();

    Ok(())
}
