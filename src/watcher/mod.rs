//! File system watching and initial listing.
//!
//! This module provides:
//! - Recursive directory watching using notify-rs
//! - Translation of raw notify events into membership events
//! - A bounded, ignore-aware listing for seeding the tracker

mod events;
mod scanner;
#[allow(clippy::module_inception)]
mod watcher;

pub use events::WorkspaceEvent;
pub use scanner::{list_async, FileLister, Listing, WalkLister};
pub use watcher::{EventSource, FileWatcher};
