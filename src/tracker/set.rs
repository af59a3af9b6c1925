//! The authoritative set of known workspace paths.

use std::collections::HashSet;

use super::path::CanonicalPath;

/// Set of canonical paths.
///
/// Not synchronized; the tracker keeps it behind a single lock and only
/// touches it outside of any await point.
#[derive(Debug, Default, Clone)]
pub struct TrackedSet {
    paths: HashSet<CanonicalPath>,
}

impl TrackedSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a path. Returns `false` if it was already present.
    pub fn add(&mut self, path: CanonicalPath) -> bool {
        self.paths.insert(path)
    }

    /// Remove both the file and directory forms of `path`.
    ///
    /// Returns the number of keys evicted.
    pub fn remove(&mut self, path: &CanonicalPath) -> usize {
        let file = path.file_form();
        let dir = path.dir_form();
        usize::from(self.paths.remove(&file)) + usize::from(self.paths.remove(&dir))
    }

    /// Whether `path` is present in exactly this form.
    #[must_use]
    pub fn contains(&self, path: &CanonicalPath) -> bool {
        self.paths.contains(path)
    }

    /// Point-in-time copy of the members.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CanonicalPath> {
        self.paths.iter().cloned().collect()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Drop every member.
    pub fn clear(&mut self) {
        self.paths.clear();
    }
}
