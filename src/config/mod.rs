//! Configuration management for the workspace tracker.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - Built-in defaults (lowest priority)

mod settings;

pub use settings::{TrackerConfig, DEFAULT_DEBOUNCE, DEFAULT_MAX_INITIAL_ENTRIES};
