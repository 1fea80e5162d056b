use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ExecutorConfig;
use crate::context::{self, Installed, WorkerContext};
use crate::pool::Pool;
use crate::slot::{PromotableSlot, TaskSlot};
use crate::stats::{ExecutorStats, ExecutorStatsSnapshot};

/// Public fork/join executor. Owns the worker pool and is the sole entry
/// point that installs a fresh [`WorkerContext`] before running user code, so
/// that `fork`/`join`/`invoke` always find one ambient.
pub struct Executor {
    pool: Arc<Pool>,
    config: Arc<ExecutorConfig>,
    stats: Arc<ExecutorStats>,
}

impl Executor {
    /// Builds an executor and its worker pool from a validated config.
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        let config = Arc::new(config);
        let stats = Arc::new(ExecutorStats::new(config.stats_enabled()));
        let pool = Pool::new(Arc::clone(&config), Arc::clone(&stats));
        tracing::info!(
            worker_count = config.worker_count(),
            heartbeat_period = ?config.heartbeat_period(),
            "heartbeat executor started"
        );
        Self { pool, config, stats }
    }

    /// Runs `task` synchronously on the calling thread, after installing a
    /// fresh [`WorkerContext`] derived from this executor's config. Returns
    /// the task's result; a panicking task's payload is resumed here so
    /// `submit` observes the same panic a direct call to `task` would have
    /// produced.
    ///
    /// # Panics
    ///
    /// Resumes `task`'s panic, if any. Also panics if called after
    /// [`Self::shutdown`]: submitting work to a shut-down executor is a
    /// contract violation, since its workers have already been told to exit.
    pub fn submit<F, T>(&self, task: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        assert!(
            !self.pool.is_shutdown(),
            "Executor::submit called after shutdown; no worker remains to run it"
        );

        self.stats.record_submitted();

        let context = WorkerContext::fresh(Arc::clone(&self.config));
        let installed = Installed {
            context,
            pool: Arc::clone(&self.pool),
            stats: Arc::clone(&self.stats),
        };

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| context::with_installed(installed, task)));

        match outcome {
            Ok((value, _installed)) => {
                self.stats.record_completed(false);
                value
            }
            Err(panic) => {
                self.stats.record_completed(true);
                std::panic::resume_unwind(panic);
            }
        }
    }

    /// Dispatches `task` onto the worker pool and returns a [`JoinHandle`]
    /// for its eventual result; otherwise identical semantics to
    /// [`Self::submit`].
    ///
    /// # Panics
    ///
    /// Panics if called after [`Self::shutdown`], for the same reason as
    /// [`Self::submit`]: a shut-down pool has no worker left to dispatch to,
    /// so silently queuing the job would leave its `JoinHandle` blocked
    /// forever instead of surfacing the contract violation.
    #[must_use]
    pub fn submit_async<F, T>(&self, task: F) -> JoinHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        assert!(
            !self.pool.is_shutdown(),
            "Executor::submit_async called after shutdown; no worker remains to run it"
        );

        self.stats.record_submitted();

        let slot = Arc::new(TaskSlot::pending(Box::new(task)));
        let dispatch_slot = Arc::clone(&slot);
        let pool = Arc::clone(&self.pool);
        let config = Arc::clone(&self.config);
        let stats = Arc::clone(&self.stats);

        self.pool.dispatch(Box::new(move || {
            let context = WorkerContext::fresh(config);
            let installed = Installed {
                context,
                pool,
                stats: Arc::clone(&stats),
            };
            let (panicked, _installed) =
                context::with_installed(installed, move || PromotableSlot::run(&*dispatch_slot));
            stats.record_completed(panicked);
        }));

        JoinHandle { slot }
    }

    /// Rejects further `submit`/`submit_async` calls and wakes every parked
    /// worker so they can observe the shutdown flag and exit once their
    /// queue drains.
    pub fn shutdown(&self) {
        tracing::info!("heartbeat executor shutting down");
        self.pool.shutdown();
    }

    /// Blocks up to `timeout` for every worker thread to exit. Returns
    /// whether the pool quiesced within the deadline.
    #[must_use]
    pub fn await_termination(&self, timeout: Duration) -> bool {
        self.pool.await_termination(timeout)
    }

    /// The config this executor was built with.
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Immutable snapshot of executor-wide counters.
    #[must_use]
    pub fn stats(&self) -> ExecutorStatsSnapshot {
        self.stats.snapshot()
    }
}

/// Handle to a task dispatched via [`Executor::submit_async`]. Blocks on
/// [`Self::join`] until the task's shared result slot is published.
pub struct JoinHandle<T> {
    slot: Arc<TaskSlot<T>>,
}

impl<T: Send + 'static> JoinHandle<T> {
    /// Blocks the calling thread until the task completes, then returns its
    /// result.
    ///
    /// # Panics
    ///
    /// Resumes the task's panic, if it panicked.
    pub fn join(self) -> T {
        match self.slot.wait() {
            Ok(value) => value,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fork_join::{fork, invoke, join};

    static_assertions::assert_impl_all!(Executor: Send, Sync);
    static_assertions::assert_impl_all!(JoinHandle<()>: Send);

    fn tiny_config() -> ExecutorConfig {
        ExecutorConfig::builder()
            .heartbeat_period(Duration::from_micros(50))
            .promotion_cost(Duration::from_nanos(100))
            .worker_count(2)
            .build()
            .unwrap()
    }

    #[test]
    fn submit_runs_synchronously_and_returns_the_result() {
        let executor = Executor::new(tiny_config());
        assert_eq!(executor.submit(|| 2 + 2), 4);
    }

    #[test]
    fn submit_async_runs_on_the_pool_and_joins() {
        let executor = Executor::new(tiny_config());
        let handle = executor.submit_async(|| 1 + 1);
        assert_eq!(handle.join(), 2);
    }

    #[test]
    fn nested_fork_join_works_from_submit_and_submit_async() {
        let executor = Executor::new(tiny_config());
        assert_eq!(executor.submit(|| invoke(|| 40) + 2), 42);

        let handle = executor.submit_async(|| {
            let child = fork(|| 10);
            join(child) * 2
        });
        assert_eq!(handle.join(), 20);
    }

    #[test]
    fn stats_track_submissions_and_completions() {
        let executor = Executor::new(tiny_config());
        executor.submit(|| ());
        executor.submit_async(|| ()).join();

        let snapshot = executor.stats();
        assert_eq!(snapshot.tasks_submitted, 2);
        assert_eq!(snapshot.tasks_completed, 2);
        assert_eq!(snapshot.tasks_panicked, 0);
    }

    #[test]
    fn shutdown_then_await_termination_quiesces_the_pool() {
        let executor = Executor::new(tiny_config());
        executor.submit(|| ());
        executor.shutdown();
        assert!(executor.await_termination(Duration::from_secs(5)));
    }

    #[test]
    #[should_panic(expected = "submit called after shutdown")]
    fn submit_after_shutdown_is_a_contract_violation() {
        let executor = Executor::new(tiny_config());
        executor.shutdown();
        executor.await_termination(Duration::from_secs(5));
        executor.submit(|| ());
    }

    #[test]
    #[should_panic(expected = "submit_async called after shutdown")]
    fn submit_async_after_shutdown_is_a_contract_violation() {
        let executor = Executor::new(tiny_config());
        executor.shutdown();
        executor.await_termination(Duration::from_secs(5));
        executor.submit_async(|| ());
    }
}
