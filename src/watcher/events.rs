//! Workspace membership events.

#![allow(clippy::missing_const_for_fn)]

use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};

/// Membership change reported by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    /// Paths were created.
    Created(Vec<PathBuf>),
    /// Paths were deleted.
    Deleted(Vec<PathBuf>),
    /// Paths were renamed, as `(from, to)` pairs.
    Renamed(Vec<(PathBuf, PathBuf)>),
}

impl WorkspaceEvent {
    /// Short name of the event kind, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Deleted(_) => "deleted",
            Self::Renamed(_) => "renamed",
        }
    }

    /// Number of paths (or rename pairs) carried.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Created(paths) | Self::Deleted(paths) => paths.len(),
            Self::Renamed(pairs) => pairs.len(),
        }
    }

    /// Check if the event carries no paths.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Translate a raw `notify` event.
    ///
    /// Content modifications do not change membership and map to `None`.
    /// Rename halves without a partner become a delete or a create; a rename
    /// of unknown direction is decided by whether the path still exists.
    #[must_use]
    pub fn from_notify(event: Event) -> Option<Self> {
        let Event { kind, mut paths, .. } = event;

        let translated = match kind {
            EventKind::Create(_) => Self::Created(paths),
            EventKind::Remove(_) => Self::Deleted(paths),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() >= 2 => {
                let to = paths.pop()?;
                let from = paths.pop()?;
                Self::Renamed(vec![(from, to)])
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Self::Deleted(paths),
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Self::Created(paths),
            EventKind::Modify(ModifyKind::Name(_)) => {
                let (existing, gone): (Vec<_>, Vec<_>) =
                    paths.into_iter().partition(|p| p.exists());
                if gone.is_empty() {
                    Self::Created(existing)
                } else if existing.is_empty() {
                    Self::Deleted(gone)
                } else {
                    Self::Renamed(
                        gone.into_iter()
                            .zip(existing)
                            .collect(),
                    )
                }
            }
            _ => return None,
        };

        (!translated.is_empty()).then_some(translated)
    }
}
