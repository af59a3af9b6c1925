//! Bounded directory listing for initial seeding.
//!
//! Walks the root respecting ignore files and skipping heavyweight
//! directories, stopping once the entry cap is reached.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::{DirEntry, WalkBuilder};

use crate::error::WatcherError;
use crate::Result;

/// Directory names never descended into.
const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "__pycache__",
    "env",
    "venv",
    "target",
    "build",
    "dist",
    "out",
    "bundle",
    "vendor",
    "tmp",
    "temp",
    "deps",
    "pkg",
    "Pods",
];

/// Result of a bounded listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Files and directories found, excluding the root itself.
    pub paths: Vec<PathBuf>,
    /// Whether entries were left out because of the cap.
    pub truncated: bool,
}

/// Produces the initial listing of a workspace.
pub trait FileLister: Send + Sync + 'static {
    /// List up to `limit` entries under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be listed at all.
    fn list(&self, root: &Path, limit: usize) -> Result<Listing>;
}

/// Default lister backed by `ignore::WalkBuilder`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkLister;

impl FileLister for WalkLister {
    fn list(&self, root: &Path, limit: usize) -> Result<Listing> {
        if !root.is_dir() {
            return Err(WatcherError::listing(root, "not a directory").into());
        }

        tracing::info!(path = %root.display(), limit, "Starting workspace listing");

        let walker = WalkBuilder::new(root)
            .hidden(true) // Skip hidden files/dirs
            .git_ignore(true) // Respect .gitignore
            .git_global(true) // Respect global gitignore
            .git_exclude(true) // Respect .git/info/exclude
            .ignore(true) // Respect .ignore files
            .parents(true) // Check parent directories for ignore files
            .require_git(false)
            .filter_entry(|entry| !is_default_ignored(entry))
            .build();

        let mut listing = Listing::default();
        let mut errors = 0_u64;

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.depth() == 0 {
                        continue;
                    }
                    if listing.paths.len() >= limit {
                        listing.truncated = true;
                        break;
                    }
                    listing.paths.push(entry.into_path());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Error walking directory");
                    errors += 1;
                }
            }
        }

        tracing::info!(
            path = %root.display(),
            found = listing.paths.len(),
            truncated = listing.truncated,
            errors,
            "Workspace listing complete"
        );

        Ok(listing)
    }
}

/// Run a lister on the blocking pool.
///
/// # Errors
///
/// Returns an error if the listing fails or the blocking task panics.
pub async fn list_async(
    lister: Arc<dyn FileLister>,
    root: &Path,
    limit: usize,
) -> Result<Listing> {
    let root = root.to_path_buf();

    tokio::task::spawn_blocking(move || lister.list(&root, limit))
        .await
        .map_err(|e| crate::Error::internal(format!("Listing task failed: {e}")))?
}

/// Check if a directory entry should be pruned from the walk.
fn is_default_ignored(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
        return false;
    }

    let name = entry.file_name().to_string_lossy();
    IGNORED_DIRS.iter().any(|&d| name == d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(listing: &Listing, root: &Path) -> Vec<String> {
        let mut names: Vec<String> = listing
            .paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_lists_files_and_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(tmp.path().join("README.md"), "# Readme").unwrap();

        let listing = WalkLister.list(tmp.path(), 100).unwrap();
        assert!(!listing.truncated);
        assert_eq!(
            names(&listing, tmp.path()),
            vec!["README.md", "src", "src/main.rs"]
        );
    }

    #[test]
    fn test_skips_ignored_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("node_modules/pkg")).unwrap();
        fs::write(tmp.path().join("node_modules/pkg/index.js"), "").unwrap();
        fs::create_dir(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join(".git/config"), "").unwrap();
        fs::write(tmp.path().join("keep.txt"), "").unwrap();

        let listing = WalkLister.list(tmp.path(), 100).unwrap();
        assert_eq!(names(&listing, tmp.path()), vec!["keep.txt"]);
    }

    #[test]
    fn test_respects_gitignore() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".gitignore"), "*.log\n").unwrap();
        fs::write(tmp.path().join("debug.log"), "").unwrap();
        fs::write(tmp.path().join("main.rs"), "").unwrap();

        let listing = WalkLister.list(tmp.path(), 100).unwrap();
        assert_eq!(names(&listing, tmp.path()), vec!["main.rs"]);
    }

    #[test]
    fn test_truncates_at_limit() {
        let tmp = TempDir::new().unwrap();
        for i in 0..5 {
            fs::write(tmp.path().join(format!("f{i}.txt")), "").unwrap();
        }

        let listing = WalkLister.list(tmp.path(), 2).unwrap();
        assert_eq!(listing.paths.len(), 2);
        assert!(listing.truncated);
    }

    #[test]
    fn test_exact_limit_is_not_truncated() {
        let tmp = TempDir::new().unwrap();
        for i in 0..3 {
            fs::write(tmp.path().join(format!("f{i}.txt")), "").unwrap();
        }

        let listing = WalkLister.list(tmp.path(), 3).unwrap();
        assert_eq!(listing.paths.len(), 3);
        assert!(!listing.truncated);
    }

    #[test]
    fn test_missing_root_fails() {
        let err = WalkLister.list(Path::new("/nonexistent/root"), 10).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[tokio::test]
    async fn test_list_async() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "").unwrap();

        let listing = list_async(Arc::new(WalkLister), tmp.path(), 10).await.unwrap();
        assert_eq!(listing.paths.len(), 1);
    }
}
