//! Debounced tracking of the paths inside a workspace.
//!
//! Watcher events are turned into tracked path operations. Each handler
//! waits for its own operations, then asks the debounce scheduler for an
//! update; the scheduler waits out the quiet period, drains whatever is
//! still in flight and sends one snapshot to the consumer.

mod coordinator;
mod debounce;
mod emitter;
mod path;
mod resolver;
mod set;
mod stats;

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::Instrument;

pub use coordinator::{OperationCoordinator, PendingOperation};
pub use debounce::DebounceScheduler;
pub use emitter::{relative_paths, JsonLinesSink, SnapshotEmitter, UpdateSink, WorkspaceUpdate};
pub use path::{normalize, CanonicalPath, Root};
pub use resolver::{resolve, Resolved};
pub use set::TrackedSet;
pub use stats::{TrackerStats, TrackerStatsSnapshot};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::observability::spans;
use crate::watcher::{list_async, EventSource, FileLister, WorkspaceEvent};
use crate::Result;

/// Number of initial paths resolved concurrently.
const SEED_BATCH_SIZE: usize = 100;

/// Tracks the file list of one workspace root.
///
/// Cheap to clone; clones share state. Call [`dispose`](Self::dispose) to
/// stop listening and release resources.
#[derive(Clone)]
pub struct WorkspaceTracker {
    shared: Arc<Shared>,
}

struct Shared {
    root: Option<Root>,
    max_initial_entries: usize,
    set: Arc<Mutex<TrackedSet>>,
    coordinator: OperationCoordinator,
    scheduler: DebounceScheduler,
    stats: Arc<TrackerStats>,
    listener: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl std::fmt::Debug for WorkspaceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceTracker")
            .field("root", &self.shared.root)
            .field("paths", &self.shared.set.lock().len())
            .field("pending", &self.shared.coordinator.pending_count())
            .finish_non_exhaustive()
    }
}

impl WorkspaceTracker {
    /// Create a tracker delivering updates to `sink`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(config: &TrackerConfig, sink: Arc<dyn UpdateSink>) -> Self {
        let root = config.root.as_ref().map(Root::new);
        let set = Arc::new(Mutex::new(TrackedSet::new()));
        let coordinator = OperationCoordinator::new();
        let stats = TrackerStats::new();

        let emitter = SnapshotEmitter::new(
            root.clone(),
            Arc::clone(&set),
            sink,
            Arc::clone(&stats),
        );
        let scheduler = DebounceScheduler::spawn(config.debounce, coordinator.clone(), emitter);

        Self {
            shared: Arc::new(Shared {
                root,
                max_initial_entries: config.max_initial_entries,
                set,
                coordinator,
                scheduler,
                stats,
                listener: Mutex::new(None),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Seed the set from a bounded listing, emit it, then start consuming
    /// live events from `source`.
    ///
    /// Listing failures are logged; the tracker then starts empty and is
    /// kept current by live events.
    pub async fn initialize<S: EventSource>(&self, lister: Arc<dyn FileLister>, source: S) {
        if let Some(root) = self.shared.root.clone() {
            match list_async(lister, root.path(), self.shared.max_initial_entries).await {
                Ok(listing) => {
                    if listing.truncated {
                        tracing::warn!(
                            path = %root.path().display(),
                            limit = self.shared.max_initial_entries,
                            "Workspace file listing truncated due to size limit"
                        );
                    }

                    for batch in listing.paths.chunks(SEED_BATCH_SIZE) {
                        join_all(
                            batch
                                .iter()
                                .map(|p| add_path(Arc::clone(&self.shared), p.clone())),
                        )
                        .await;
                    }

                    self.update().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to initialize file paths");
                }
            }
        }

        self.listen(source);
    }

    /// Consume events from `source` until it ends or the tracker is disposed.
    ///
    /// Each event is handled in its own task. Replaces any earlier source.
    pub fn listen<S: EventSource>(&self, source: S) {
        if self.is_disposed() {
            return;
        }

        let task = tokio::spawn(pump(Arc::downgrade(&self.shared), source));
        if let Some(previous) = self.shared.listener.lock().replace(task) {
            previous.abort();
        }
    }

    /// Apply one watcher event and schedule an update.
    pub async fn handle_event(&self, event: WorkspaceEvent) {
        if self.is_disposed() {
            return;
        }
        TrackerStats::bump(&self.shared.stats.events_received);

        let span = spans::event_span(event.kind(), event.len());
        match event {
            WorkspaceEvent::Created(paths) => self.on_created(paths).instrument(span).await,
            WorkspaceEvent::Deleted(paths) => self.on_deleted(paths).instrument(span).await,
            WorkspaceEvent::Renamed(pairs) => self.on_renamed(pairs).instrument(span).await,
        }
    }

    /// Handle created paths.
    pub async fn on_created(&self, paths: Vec<PathBuf>) {
        let ops = paths
            .into_iter()
            .map(|p| self.track(add_path(Arc::clone(&self.shared), p)))
            .collect();
        self.settle(ops).await;
    }

    /// Handle deleted paths.
    pub async fn on_deleted(&self, paths: Vec<PathBuf>) {
        let ops = paths
            .into_iter()
            .map(|p| {
                let shared = Arc::clone(&self.shared);
                self.track(async move { remove_path(&shared, &p) })
            })
            .collect();
        self.settle(ops).await;
    }

    /// Handle renamed paths.
    ///
    /// The removal and the addition are two independent mutations; a failure
    /// in one does not undo the other.
    pub async fn on_renamed(&self, pairs: Vec<(PathBuf, PathBuf)>) {
        let ops = pairs
            .into_iter()
            .map(|(from, to)| {
                let shared = Arc::clone(&self.shared);
                self.track(async move {
                    let removed = remove_path(&shared, &from);
                    let added = add_path(Arc::clone(&shared), to).await;
                    removed.and(added)
                })
            })
            .collect();
        self.settle(ops).await;
    }

    /// Ask for a debounced update.
    ///
    /// Resolves once the coalesced emission covering this request is done.
    pub fn request_update(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        self.shared.scheduler.request_update()
    }

    /// Stop listening, cancel any pending update and clear state.
    ///
    /// Calling it again is a no-op.
    pub fn dispose(&self) {
        if self.shared.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.shared.scheduler.cancel();
        if let Some(listener) = self.shared.listener.lock().take() {
            listener.abort();
        }
        self.shared.set.lock().clear();

        tracing::info!("Workspace tracker disposed");
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::SeqCst)
    }

    /// Workspace root, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Root> {
        self.shared.root.as_ref()
    }

    /// Current members as canonical paths.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CanonicalPath> {
        self.shared.set.lock().snapshot()
    }

    /// Current members relative to the root, sorted. Empty without a root.
    #[must_use]
    pub fn file_paths(&self) -> Vec<String> {
        self.shared
            .root
            .as_ref()
            .map(|root| relative_paths(&self.shared.set.lock(), root))
            .unwrap_or_default()
    }

    /// Number of path operations still in flight.
    #[must_use]
    pub fn pending_operations(&self) -> usize {
        self.shared.coordinator.pending_count()
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> TrackerStatsSnapshot {
        self.shared.stats.snapshot()
    }

    fn track<F>(&self, task: F) -> PendingOperation
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.shared.coordinator.track(task)
    }

    async fn settle(&self, ops: Vec<PendingOperation>) {
        join_all(ops).await;
        self.update().await;
    }

    async fn update(&self) {
        match self.request_update().await {
            Ok(()) => {}
            Err(crate::Error::Tracker(TrackerError::Disposed)) => {
                tracing::debug!("Update dropped, tracker disposed");
            }
            Err(e) => {
                tracing::error!(error = %e, "Error handling file operations");
            }
        }
    }
}

async fn pump<S: EventSource>(shared: Weak<Shared>, mut source: S) {
    while let Some(event) = source.next_event().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        let tracker = WorkspaceTracker { shared };
        if tracker.is_disposed() {
            break;
        }
        tokio::spawn(async move { tracker.handle_event(event).await });
    }
    tracing::debug!("Event source closed");
}

#[allow(clippy::unnecessary_wraps)]
async fn add_path(shared: Arc<Shared>, raw: PathBuf) -> Result<()> {
    let resolved = resolve(&raw, shared.root.as_ref()).await;
    if !resolved.stat_ok {
        TrackerStats::bump(&shared.stats.stat_failures);
    }

    // `dispose` clears under this lock, so the flag must be read under it too.
    let mut set = shared.set.lock();
    if shared.disposed.load(Ordering::SeqCst) {
        tracing::debug!(path = %resolved.path, "Tracker disposed, dropping add");
        return Ok(());
    }
    if set.add(resolved.path) {
        TrackerStats::bump(&shared.stats.paths_added);
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn remove_path(shared: &Shared, raw: &std::path::Path) -> Result<()> {
    let path = normalize(raw, shared.root.as_ref());
    let removed = shared.set.lock().remove(&path);
    if removed > 0 {
        shared
            .stats
            .paths_removed
            .fetch_add(removed as u64, Ordering::Relaxed);
    }
    Ok(())
}
