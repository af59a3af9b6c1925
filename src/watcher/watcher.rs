//! File system watcher using notify-rs.

use std::future::Future;
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::events::WorkspaceEvent;
use crate::error::WatcherError;
use crate::Result;

/// Source of workspace events consumed by the tracker.
pub trait EventSource: Send + 'static {
    /// Receive the next event, or `None` once the source is exhausted.
    fn next_event(&mut self) -> impl Future<Output = Option<WorkspaceEvent>> + Send;
}

impl EventSource for mpsc::UnboundedReceiver<WorkspaceEvent> {
    fn next_event(&mut self) -> impl Future<Output = Option<WorkspaceEvent>> + Send {
        self.recv()
    }
}

/// Recursive watch on one workspace root.
///
/// Dropping the watcher releases the OS subscription.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<WorkspaceEvent>,
    root: PathBuf,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Start watching `root` recursively.
    ///
    /// # Errors
    ///
    /// Returns an error if the root does not exist or cannot be watched.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            return Err(WatcherError::WatchFailed {
                path: root.display().to_string(),
                reason: "directory does not exist".to_string(),
            }
            .into());
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        // The notify thread must never block on us, hence the unbounded channel.
        let mut watcher = notify::recommended_watcher(
            move |result: std::result::Result<notify::Event, notify::Error>| match result {
                Ok(event) => {
                    if let Some(event) = WorkspaceEvent::from_notify(event) {
                        let _ = event_tx.send(event);
                    }
                }
                Err(e) => {
                    tracing::error!("Watch error: {:?}", e);
                }
            },
        )
        .map_err(|e| WatcherError::WatchFailed {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| WatcherError::WatchFailed {
                path: root.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(path = %root.display(), "Watching directory");

        Ok(Self {
            watcher,
            event_rx,
            root,
        })
    }

    /// Receive the next event.
    ///
    /// Returns `None` if the watcher has shut down.
    pub async fn recv(&mut self) -> Option<WorkspaceEvent> {
        self.event_rx.recv().await
    }

    /// Watched root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stop watching. Events already queued can still be received.
    ///
    /// # Errors
    ///
    /// Returns an error if unwatching fails.
    pub fn unwatch(&mut self) -> Result<()> {
        self.watcher
            .unwatch(&self.root)
            .map_err(|e| WatcherError::WatchFailed {
                path: self.root.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(path = %self.root.display(), "Stopped watching directory");
        Ok(())
    }
}

impl EventSource for FileWatcher {
    fn next_event(&mut self) -> impl Future<Output = Option<WorkspaceEvent>> + Send {
        self.recv()
    }
}
