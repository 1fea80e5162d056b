use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use heartbeat_tracker::TrackerStats;

/// Immutable, point-in-time snapshot of one [`WorkerContext`](crate::WorkerContext)'s counters.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct WorkerStats {
    pub operations: u64,
    pub polls: u64,
    pub promotions: u64,
    pub tracker: TrackerStats,
    pub oldest_outstanding_age: Option<Duration>,
}

impl WorkerStats {
    /// `promotions / operations`, or `0.0` if no operations were recorded yet.
    #[must_use]
    pub fn promotion_rate(&self) -> f64 {
        if self.operations == 0 {
            0.0
        } else {
            self.promotions as f64 / self.operations as f64
        }
    }
}

/// Executor-wide, cross-worker counters. Cheap `Relaxed` atomics; exact
/// ordering between them is not guaranteed, only their eventual totals.
///
/// Recording is skipped entirely when `stats_enabled` is `false`
/// (`ExecutorConfig::stats_enabled`). `snapshot` then always returns zeros
/// rather than paying for atomics nobody asked for.
#[derive(Debug)]
pub struct ExecutorStats {
    enabled: bool,
    tasks_submitted: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_panicked: AtomicU64,
    workers_spawned: AtomicU64,
}

impl ExecutorStats {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            tasks_submitted: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
            workers_spawned: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_submitted(&self) {
        if self.enabled {
            self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_completed(&self, panicked: bool) {
        if !self.enabled {
            return;
        }
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        if panicked {
            self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_worker_spawned(&self) {
        if self.enabled {
            self.workers_spawned.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Immutable snapshot of the current totals. All zero if
    /// `stats_enabled` was `false` at construction.
    #[must_use]
    pub fn snapshot(&self) -> ExecutorStatsSnapshot {
        ExecutorStatsSnapshot {
            tasks_submitted: self.tasks_submitted.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
            workers_spawned: self.workers_spawned.load(Ordering::Relaxed),
        }
    }
}

/// Immutable, point-in-time snapshot of [`Executor`](crate::Executor)-wide counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutorStatsSnapshot {
    pub tasks_submitted: u64,
    pub tasks_completed: u64,
    pub tasks_panicked: u64,
    pub workers_spawned: u64,
}
