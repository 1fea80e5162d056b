//! The fork/join executor component of heartbeat scheduling.
//!
//! Ties together [`heartbeat_timer::Timer`]/[`heartbeat_timer::PollingStrategy`]
//! and [`heartbeat_tracker::PromotionTracker`] into a [`WorkerContext`] bound
//! to the currently executing worker, and exposes the public surface a
//! program actually calls: [`Executor::submit`]/[`Executor::submit_async`] to
//! admit top-level work, and the free functions [`fork`]/[`join`]/[`invoke`]
//! to express nested parallelism from inside it.
//!
//! Forks stay sequential by default. On a heartbeat, the oldest outstanding
//! fork on the current worker is promoted to an independent pool worker with
//! its own freshly initialized context, never inherited from the forking
//! worker. A `join` either blocks on that promoted worker's result or, if no
//! promotion happened yet, simply pops and runs the child inline.

mod config;
mod context;
mod error;
mod executor;
mod fork_join;
mod join_counter;
mod loom;
mod pool;
mod slot;
mod stats;

pub use config::{ExecutorConfig, ExecutorConfigBuilder};
pub use error::ConfigError;
pub use executor::{Executor, JoinHandle};
pub use fork_join::{fork, invoke, join, Forked};
pub use join_counter::JoinCounter;
pub use stats::{ExecutorStatsSnapshot, WorkerStats};

/// Whether a `WorkerContext` is installed on the calling thread. Exposed for
/// callers that want to check `fork`/`join`/`invoke` eligibility before
/// calling them (e.g. a library that may or may not be running inside a
/// `submit`ted task) without risking the contract-violation panic.
#[must_use]
pub fn is_in_task() -> bool {
    context::is_installed()
}

/// Snapshot of the calling worker's own timer/strategy/tracker counters, or
/// `None` if no context is installed on this thread. Unlike
/// `Executor::stats`, this is only ever meaningful from inside a running
/// task, since the underlying `WorkerContext` is worker-local and torn down
/// when the task finishes.
#[must_use]
pub fn current_worker_stats() -> Option<WorkerStats> {
    if !context::is_installed() {
        return None;
    }
    Some(context::with_current(|installed| installed.context.stats()))
}
