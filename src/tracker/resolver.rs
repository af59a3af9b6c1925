//! Async resolution of raw paths into tagged membership keys.

use std::path::Path;

use super::path::{normalize, CanonicalPath, Root};

/// Result of probing a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Membership key, directory-tagged when the lookup saw a directory.
    pub path: CanonicalPath,
    /// Whether the lookup saw a directory.
    pub is_dir: bool,
    /// Whether the metadata lookup succeeded.
    pub stat_ok: bool,
}

/// Normalize `raw` and look up its metadata.
///
/// A failed lookup (usually a path deleted before we got to it) is logged and
/// the untagged file form is returned so the key stays removable.
pub async fn resolve(raw: &Path, root: Option<&Root>) -> Resolved {
    let normalized = normalize(raw, root);

    match tokio::fs::metadata(normalized.to_path_buf()).await {
        Ok(metadata) if metadata.is_dir() => Resolved {
            path: normalized.into_directory(),
            is_dir: true,
            stat_ok: true,
        },
        Ok(_) => Resolved {
            path: normalized,
            is_dir: false,
            stat_ok: true,
        },
        Err(e) => {
            tracing::warn!(path = %normalized, error = %e, "Failed to stat path");
            Resolved {
                path: normalized,
                is_dir: false,
                stat_ok: false,
            }
        }
    }
}
