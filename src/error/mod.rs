//! Error types and Result aliases for the workspace tracker.
//!
//! This module defines the error hierarchy used throughout the crate.
//! Most failures inside the tracker are logged and absorbed; these types
//! cover configuration, watcher setup and the few calls that report back
//! to their caller.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tracker operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// File watching or listing error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Tracker lifecycle or delivery error.
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// File watcher and initial listing errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// Initial directory listing failed.
    #[error("failed to list '{path}': {reason}")]
    ListingFailed { path: String, reason: String },
}

/// Tracker errors.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// The tracker was disposed before the request completed.
    #[error("tracker has been disposed")]
    Disposed,

    /// The consumer channel rejected an update.
    #[error("failed to deliver workspace update: {0}")]
    Delivery(String),

    /// The debounce scheduler stopped without answering.
    #[error("update scheduler closed")]
    SchedulerClosed,
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl WatcherError {
    /// Create a listing error for `path`.
    pub fn listing(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::ListingFailed {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }
}
