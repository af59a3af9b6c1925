//! Canonical path keys and the workspace root.
//!
//! Normalization is purely lexical: separators are forced to `/`, `.` and
//! `..` segments are collapsed and relative input is resolved against the
//! root. Nothing here touches the filesystem.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Normalized membership key for a filesystem entry.
///
/// Absolute and `/`-separated. Ends with `/` iff the entry is a directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    /// Borrow the key as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key carries the directory tag.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.0.ends_with('/')
    }

    /// The same key tagged as a directory.
    #[must_use]
    pub fn into_directory(mut self) -> Self {
        if !self.is_dir() {
            self.0.push('/');
        }
        self
    }

    /// File form of this key (directory tag removed).
    #[must_use]
    pub fn file_form(&self) -> Self {
        if self.is_dir() && self.0.len() > 1 {
            Self(self.0.trim_end_matches('/').to_string())
        } else {
            self.clone()
        }
    }

    /// Directory form of this key.
    #[must_use]
    pub fn dir_form(&self) -> Self {
        self.clone().into_directory()
    }

    /// Path suitable for probing the filesystem.
    #[must_use]
    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }

    /// Express this key relative to `root`.
    ///
    /// Directory keys keep their trailing `/`. Keys outside the root climb out
    /// with `..` segments; keys on another drive are returned unchanged.
    #[must_use]
    pub fn relative_to(&self, root: &Root) -> String {
        let (prefix, segments) = split_absolute(&self.0);
        let (root_prefix, root_segments) = split_absolute(&root.key);

        if !prefix.eq_ignore_ascii_case(root_prefix) {
            return self.0.clone();
        }

        let common = segments
            .iter()
            .zip(root_segments.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut parts: Vec<&str> = Vec::with_capacity(root_segments.len() + segments.len());
        parts.extend(std::iter::repeat("..").take(root_segments.len() - common));
        parts.extend(segments[common..].iter().copied());

        let mut relative = parts.join("/");
        if self.is_dir() && !relative.is_empty() {
            relative.push('/');
        }
        relative
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Base directory all emitted paths are expressed against.
///
/// Fixed for the lifetime of a tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    path: PathBuf,
    key: String,
}

impl Root {
    /// Create a root from a directory path. Relative paths are resolved
    /// against the process working directory.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let key = absolutize(&path.to_string_lossy(), None);
        Self {
            path: PathBuf::from(&key),
            key,
        }
    }

    /// Root as a filesystem path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Root in canonical string form, without trailing slash.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

/// Normalize a raw path into its untagged canonical form.
///
/// Absolute input only has its separators and dot segments cleaned up;
/// relative input is first resolved against `root`, or against the working
/// directory when there is no root. Never fails.
pub fn normalize(raw: impl AsRef<Path>, root: Option<&Root>) -> CanonicalPath {
    CanonicalPath(absolutize(&raw.as_ref().to_string_lossy(), root))
}

fn absolutize(raw: &str, root: Option<&Root>) -> String {
    let slashed = raw.replace('\\', "/");

    if drive_prefix(&slashed).is_some() || slashed.starts_with('/') {
        return collapse(&slashed);
    }

    let base = root.map_or_else(
        || {
            std::env::current_dir()
                .map(|dir| collapse(&dir.to_string_lossy().replace('\\', "/")))
                .unwrap_or_else(|_| "/".to_string())
        },
        |root| root.key.clone(),
    );
    collapse(&format!("{base}/{slashed}"))
}

/// Collapse an absolute, `/`-separated path.
fn collapse(absolute: &str) -> String {
    let (prefix, rest) = match drive_prefix(absolute) {
        Some(prefix) => (prefix, &absolute[prefix.len()..]),
        None => ("", absolute),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("{prefix}/{}", segments.join("/"))
}

/// Windows drive prefix such as `C:`.
fn drive_prefix(path: &str) -> Option<&str> {
    let bytes = path.as_bytes();
    if bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/')
    {
        Some(&path[..2])
    } else {
        None
    }
}

fn split_absolute(path: &str) -> (&str, Vec<&str>) {
    let (prefix, rest) = match drive_prefix(path) {
        Some(prefix) => (prefix, &path[prefix.len()..]),
        None => ("", path),
    };
    let segments = rest.split('/').filter(|s| !s.is_empty()).collect();
    (prefix, segments)
}
