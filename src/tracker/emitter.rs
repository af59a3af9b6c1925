//! Snapshot emission to the downstream consumer.

use std::io::Write;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::path::Root;
use super::set::TrackedSet;
use super::stats::TrackerStats;
use crate::error::TrackerError;
use crate::Result;

/// Message sent to the consumer after each coalesced update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "workspaceUpdated")]
pub struct WorkspaceUpdate {
    /// Root-relative, `/`-separated paths. Directories end with `/`.
    #[serde(rename = "filePaths")]
    pub file_paths: Vec<String>,
}

/// Delivery channel for workspace updates.
pub trait UpdateSink: Send + Sync + 'static {
    /// Hand one update to the consumer.
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer rejects the update.
    fn deliver(&self, update: WorkspaceUpdate) -> Result<()>;
}

impl UpdateSink for mpsc::UnboundedSender<WorkspaceUpdate> {
    fn deliver(&self, update: WorkspaceUpdate) -> Result<()> {
        self.send(update)
            .map_err(|e| TrackerError::Delivery(e.to_string()).into())
    }
}

impl UpdateSink for mpsc::Sender<WorkspaceUpdate> {
    fn deliver(&self, update: WorkspaceUpdate) -> Result<()> {
        self.try_send(update)
            .map_err(|e| TrackerError::Delivery(e.to_string()).into())
    }
}

/// Writes each update as one JSON line.
///
/// Writes happen on a dedicated thread, so `deliver` never blocks the
/// caller on a slow or stalled writer.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    line_tx: mpsc::UnboundedSender<String>,
    writer: JoinHandle<W>,
}

impl<W: Write + Send + 'static> JsonLinesSink<W> {
    /// Start the writer thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn new(writer: W) -> Result<Self> {
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let writer = std::thread::Builder::new()
            .name("update-writer".to_string())
            .spawn(move || write_lines(writer, line_rx))?;

        Ok(Self { line_tx, writer })
    }

    /// Flush queued lines, stop the thread and recover the writer.
    ///
    /// Returns `None` if the writer thread panicked.
    pub fn finish(self) -> Option<W> {
        let Self { line_tx, writer } = self;
        drop(line_tx);
        writer.join().ok()
    }
}

impl<W: Write + Send + 'static> UpdateSink for JsonLinesSink<W> {
    fn deliver(&self, update: WorkspaceUpdate) -> Result<()> {
        let line = serde_json::to_string(&update)
            .map_err(|e| TrackerError::Delivery(e.to_string()))?;
        self.line_tx
            .send(line)
            .map_err(|_| TrackerError::Delivery("writer thread stopped".to_string()).into())
    }
}

fn write_lines<W: Write>(mut writer: W, mut line_rx: mpsc::UnboundedReceiver<String>) -> W {
    while let Some(line) = line_rx.blocking_recv() {
        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            tracing::error!(error = %e, "Failed to write workspace update");
        }
    }
    writer
}

/// Express every member of `set` relative to `root`, sorted.
#[must_use]
pub fn relative_paths(set: &TrackedSet, root: &Root) -> Vec<String> {
    let mut paths: Vec<String> = set
        .snapshot()
        .iter()
        .map(|path| path.relative_to(root))
        .collect();
    paths.sort_unstable();
    paths
}

/// Reads the tracked set and delivers it to the sink.
#[derive(Clone)]
pub struct SnapshotEmitter {
    root: Option<Root>,
    set: Arc<Mutex<TrackedSet>>,
    sink: Arc<dyn UpdateSink>,
    stats: Arc<TrackerStats>,
}

impl std::fmt::Debug for SnapshotEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotEmitter")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl SnapshotEmitter {
    /// Create an emitter over a shared set.
    #[must_use]
    pub fn new(
        root: Option<Root>,
        set: Arc<Mutex<TrackedSet>>,
        sink: Arc<dyn UpdateSink>,
        stats: Arc<TrackerStats>,
    ) -> Self {
        Self {
            root,
            set,
            sink,
            stats,
        }
    }

    /// Deliver the current snapshot.
    ///
    /// Returns the delivered paths, or `None` when there is no root or the
    /// sink rejected the update. Delivery failures are logged, not retried.
    pub fn emit(&self) -> Option<Vec<String>> {
        let root = self.root.as_ref()?;
        let file_paths = relative_paths(&self.set.lock(), root);

        tracing::debug!(paths = file_paths.len(), "Emitting workspace update");

        let update = WorkspaceUpdate {
            file_paths: file_paths.clone(),
        };
        match self.sink.deliver(update) {
            Ok(()) => {
                TrackerStats::bump(&self.stats.emissions);
                Some(file_paths)
            }
            Err(e) => {
                TrackerStats::bump(&self.stats.delivery_failures);
                tracing::error!(error = %e, "Failed to send workspace update");
                None
            }
        }
    }
}
