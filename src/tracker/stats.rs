//! Counters for tracker activity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for a tracker instance.
#[derive(Debug, Default)]
pub struct TrackerStats {
    pub events_received: AtomicU64,
    pub paths_added: AtomicU64,
    pub paths_removed: AtomicU64,
    pub stat_failures: AtomicU64,
    pub emissions: AtomicU64,
    pub delivery_failures: AtomicU64,
}

impl TrackerStats {
    /// Create new stats tracker.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> TrackerStatsSnapshot {
        TrackerStatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            paths_added: self.paths_added.load(Ordering::Relaxed),
            paths_removed: self.paths_removed.load(Ordering::Relaxed),
            stat_failures: self.stat_failures.load(Ordering::Relaxed),
            emissions: self.emissions.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of tracker stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStatsSnapshot {
    pub events_received: u64,
    pub paths_added: u64,
    pub paths_removed: u64,
    pub stat_failures: u64,
    pub emissions: u64,
    pub delivery_failures: u64,
}
