//! Configuration settings and validation.

use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Quiescence window before a coalesced update is emitted.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Cap on the number of entries read by the initial listing.
pub const DEFAULT_MAX_INITIAL_ENTRIES: usize = 1_000;

/// Main configuration for a tracker instance.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Workspace root. `None` runs the tracker in no-op mode.
    pub root: Option<PathBuf>,

    /// Debounce window for coalescing updates.
    pub debounce: Duration,

    /// Maximum number of entries the initial listing may return.
    pub max_initial_entries: usize,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON.
    pub log_json: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            root: None,
            debounce: DEFAULT_DEBOUNCE,
            max_initial_entries: DEFAULT_MAX_INITIAL_ENTRIES,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl TrackerConfig {
    /// Create a configuration for the given workspace root.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.debounce.is_zero() {
            return Err(Error::config("debounce cannot be 0"));
        }

        if self.max_initial_entries == 0 {
            return Err(Error::config("max_initial_entries cannot be 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if let Some(root) = &self.root {
            if !root.is_dir() {
                return Err(Error::config(format!(
                    "root '{}' is not a directory",
                    root.display()
                )));
            }
        }

        Ok(())
    }
}
