//! Integration tests for the workspace tracker.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use workspace_tracker::error::WatcherError;
use workspace_tracker::tracker::UpdateSink;
use workspace_tracker::watcher::{FileLister, FileWatcher, Listing, WalkLister, WorkspaceEvent};
use workspace_tracker::{TrackerConfig, WorkspaceTracker, WorkspaceUpdate};

const TIMEOUT: Duration = Duration::from_secs(10);

fn tracker_for(
    root: &Path,
    max_initial_entries: usize,
) -> (WorkspaceTracker, mpsc::UnboundedReceiver<WorkspaceUpdate>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let config = TrackerConfig {
        debounce: Duration::from_millis(30),
        max_initial_entries,
        ..TrackerConfig::with_root(root)
    };
    let sink: Arc<dyn UpdateSink> = Arc::new(tx);
    (WorkspaceTracker::new(&config, sink), rx)
}

/// Wait until an update satisfies `pred`.
async fn wait_for(
    updates: &mut mpsc::UnboundedReceiver<WorkspaceUpdate>,
    pred: impl Fn(&WorkspaceUpdate) -> bool,
) -> WorkspaceUpdate {
    tokio::time::timeout(TIMEOUT, async {
        loop {
            let update = updates.recv().await.expect("update channel closed");
            if pred(&update) {
                return update;
            }
        }
    })
    .await
    .expect("timed out waiting for workspace update")
}

struct FailingLister;

impl FileLister for FailingLister {
    fn list(&self, root: &Path, _limit: usize) -> workspace_tracker::Result<Listing> {
        Err(WatcherError::listing(root, "permission denied").into())
    }
}

/// Test that a truncated listing still completes and live events flow.
#[tokio::test]
async fn test_truncated_initialization_registers_listeners() {
    let tmp = TempDir::new().unwrap();
    for i in 0..5 {
        fs::write(tmp.path().join(format!("file{i}.txt")), "x").unwrap();
    }

    let (tracker, mut updates) = tracker_for(tmp.path(), 2);
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    tracker.initialize(Arc::new(WalkLister), events_rx).await;

    let seeded = updates.recv().await.unwrap();
    assert_eq!(seeded.file_paths.len(), 2);

    fs::write(tmp.path().join("late.txt"), "x").unwrap();
    events_tx
        .send(WorkspaceEvent::Created(vec![tmp.path().join("late.txt")]))
        .unwrap();

    let update = wait_for(&mut updates, |u| u.file_paths.iter().any(|p| p == "late.txt")).await;
    assert_eq!(update.file_paths.len(), 3);

    tracker.dispose();
}

/// Test that a failed listing degrades to an empty, live-updated tracker.
#[tokio::test]
async fn test_listing_failure_still_listens() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("existing.txt"), "x").unwrap();

    let (tracker, mut updates) = tracker_for(tmp.path(), 1_000);
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    tracker.initialize(Arc::new(FailingLister), events_rx).await;
    assert!(tracker.file_paths().is_empty());

    fs::create_dir(tmp.path().join("made")).unwrap();
    events_tx
        .send(WorkspaceEvent::Created(vec![tmp.path().join("made")]))
        .unwrap();

    let update = wait_for(&mut updates, |u| !u.file_paths.is_empty()).await;
    assert_eq!(update.file_paths, vec!["made/"]);

    tracker.dispose();
}

/// Test that a rename leaves only the new path in the next emission.
#[tokio::test]
async fn test_rename_event_replaces_path() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("src")).unwrap();
    fs::write(tmp.path().join("src/old.rs"), "fn main() {}").unwrap();

    let (tracker, mut updates) = tracker_for(tmp.path(), 1_000);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    tracker.initialize(Arc::new(WalkLister), events_rx).await;
    assert_eq!(updates.recv().await.unwrap().file_paths, vec!["src/", "src/old.rs"]);

    fs::rename(tmp.path().join("src/old.rs"), tmp.path().join("src/new.rs")).unwrap();
    events_tx
        .send(WorkspaceEvent::Renamed(vec![(
            tmp.path().join("src/old.rs"),
            tmp.path().join("src/new.rs"),
        )]))
        .unwrap();

    let update = wait_for(&mut updates, |u| u.file_paths.iter().any(|p| p == "src/new.rs")).await;
    assert_eq!(update.file_paths, vec!["src/", "src/new.rs"]);

    tracker.dispose();
}

/// Test that deleting a directory removes its tagged key.
#[tokio::test]
async fn test_delete_event_removes_directory() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("docs")).unwrap();

    let (tracker, mut updates) = tracker_for(tmp.path(), 1_000);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    tracker.initialize(Arc::new(WalkLister), events_rx).await;
    assert_eq!(updates.recv().await.unwrap().file_paths, vec!["docs/"]);

    fs::remove_dir(tmp.path().join("docs")).unwrap();
    events_tx
        .send(WorkspaceEvent::Deleted(vec![tmp.path().join("docs")]))
        .unwrap();

    let update = wait_for(&mut updates, |u| u.file_paths.is_empty()).await;
    assert!(update.file_paths.is_empty());

    tracker.dispose();
}

/// Test that no updates are sent once the tracker is disposed.
#[tokio::test]
async fn test_dispose_stops_event_processing() {
    let tmp = TempDir::new().unwrap();
    let (tracker, mut updates) = tracker_for(tmp.path(), 1_000);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    tracker.initialize(Arc::new(WalkLister), events_rx).await;
    assert!(updates.recv().await.unwrap().file_paths.is_empty());

    tracker.dispose();
    tracker.dispose();

    fs::write(tmp.path().join("ignored.txt"), "x").unwrap();
    let _ = events_tx.send(WorkspaceEvent::Created(vec![tmp.path().join("ignored.txt")]));

    let next = tokio::time::timeout(Duration::from_millis(300), updates.recv()).await;
    assert!(!matches!(next, Ok(Some(_))));
    assert!(tracker.snapshot().is_empty());
}

/// Test the full pipeline against a real notify watcher.
#[tokio::test]
async fn test_live_watcher_reports_new_files() {
    let tmp = TempDir::new().unwrap();
    // Watchers report resolved paths, so track the resolved root.
    let root = tmp.path().canonicalize().unwrap();
    fs::write(root.join("seed.txt"), "x").unwrap();

    let (tracker, mut updates) = tracker_for(&root, 1_000);
    let watcher = FileWatcher::new(&root).unwrap();
    tracker.initialize(Arc::new(WalkLister), watcher).await;
    assert_eq!(updates.recv().await.unwrap().file_paths, vec!["seed.txt"]);

    fs::write(root.join("fresh.txt"), "x").unwrap();

    let update = wait_for(&mut updates, |u| u.file_paths.iter().any(|p| p == "fresh.txt")).await;
    assert!(update.file_paths.contains(&"seed.txt".to_string()));

    tracker.dispose();
}

/// Test that the listing used for seeding matches what is on disk.
#[tokio::test]
async fn test_seed_matches_walk() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("a/b")).unwrap();
    fs::write(tmp.path().join("a/b/c.txt"), "x").unwrap();
    fs::write(tmp.path().join("a/d.txt"), "x").unwrap();

    let (tracker, mut updates) = tracker_for(tmp.path(), 1_000);
    let (_events_tx, events_rx) = mpsc::unbounded_channel();
    tracker.initialize(Arc::new(WalkLister), events_rx).await;

    let on_disk = walkdir::WalkDir::new(tmp.path())
        .min_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .count();
    assert_eq!(updates.recv().await.unwrap().file_paths.len(), on_disk);

    tracker.dispose();
}
