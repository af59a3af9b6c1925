//! Workspace Tracker
//!
//! Keeps a debounced, concurrency-safe list of the files and directories
//! inside a workspace and pushes coalesced snapshots to a consumer.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod observability;
pub mod tracker;
pub mod watcher;

pub use config::TrackerConfig;
pub use error::{Error, Result};
pub use tracker::{WorkspaceTracker, WorkspaceUpdate};
