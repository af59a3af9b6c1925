//! Structured logging configuration.
//!
//! Provides setup for observability using the `tracing` crate with:
//! - Structured logging with JSON output option
//! - Configurable log levels, overridable through `RUST_LOG`
//! - Spans for watcher events and coalesced emissions

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Initialize tracing with the given level and output format.
///
/// Logs are written to stderr so stdout stays free for the update stream.
///
/// # Panics
///
/// Panics if a tracing subscriber has already been initialized in this process.
pub fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        let json_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!("Tracing initialized: level={}, json={}", level, json);
}

/// Spans attached to tracker work.
pub mod spans {
    use tracing::{debug_span, Span};

    /// Span covering the handling of one watcher event.
    #[must_use]
    pub fn event_span(kind: &'static str, paths: usize) -> Span {
        debug_span!("workspace_event", kind = kind, paths = paths)
    }

    /// Span covering one coalesced emission.
    #[must_use]
    pub fn emission_span(cycle: u64, waiters: usize) -> Span {
        debug_span!("workspace_emission", cycle = cycle, waiters = waiters)
    }
}
