use std::cell::RefCell;
use std::sync::Arc;

use heartbeat_timer::{PollingStrategy, Timer};
use heartbeat_tracker::PromotionTracker;

use crate::config::ExecutorConfig;
use crate::pool::Pool;
use crate::slot::PromotableSlot;
use crate::stats::{ExecutorStats, WorkerStats};

/// Outcome of [`WorkerContext::check_heartbeat`]: whether the caller is
/// cleared to promote the oldest outstanding fork.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Decision {
    Promote,
    Skip,
}

/// Per-worker binding of {Timer, PollingStrategy, PromotionTracker, stats}.
/// Exclusively owned by the worker it is installed on; never shared across
/// threads.
pub(crate) struct WorkerContext {
    timer: Timer,
    strategy: PollingStrategy,
    tracker: PromotionTracker<Arc<dyn PromotableSlot>>,
    config: Arc<ExecutorConfig>,
    stats_enabled: bool,
    operations: u64,
    polls: u64,
    promotions: u64,
}

impl WorkerContext {
    /// Builds a fresh context derived from the shared, immutable config.
    /// Never inherited from a parent worker: each promoted worker gets one of
    /// these, not a clone of the forking worker's.
    pub(crate) fn fresh(config: Arc<ExecutorConfig>) -> Self {
        let timer =
            Timer::new(config.heartbeat_period()).expect("ExecutorConfig already validated N > 0");
        // Count-based, amortized by default: poll roughly once every few
        // hundred operations rather than every call.
        let strategy =
            PollingStrategy::count_based(DEFAULT_POLL_INTERVAL).expect("interval is a positive constant");
        let stats_enabled = config.stats_enabled();

        Self {
            timer,
            strategy,
            tracker: PromotionTracker::new(),
            config,
            stats_enabled,
            operations: 0,
            polls: 0,
            promotions: 0,
        }
    }

    pub(crate) fn tracker_mut(&mut self) -> &mut PromotionTracker<Arc<dyn PromotableSlot>> {
        &mut self.tracker
    }

    pub(crate) fn config(&self) -> &Arc<ExecutorConfig> {
        &self.config
    }

    /// The single place that couples the polling strategy to the timer:
    /// cheap bookkeeping on every call, an amortized timer read only when the
    /// strategy says it's worth it.
    ///
    /// The strategy/timer reads themselves always run regardless of
    /// `stats_enabled`, since they decide correctness, not observability.
    /// Only the `operations`/`polls`/`promotions` counters below are skipped
    /// when stats are disabled (`ExecutorConfig::stats_enabled`).
    pub(crate) fn check_heartbeat(&mut self) -> Decision {
        if self.stats_enabled {
            self.operations += 1;
        }
        self.strategy.record_operation();

        if self.strategy.should_poll() {
            if self.stats_enabled {
                self.polls += 1;
            }
            self.strategy.record_poll();
            if self.timer.should_promote() {
                return Decision::Promote;
            }
        }
        Decision::Skip
    }

    /// Records that a promotion was actually carried out: resets the timer's
    /// elapsed clock and bumps the promotion counter.
    pub(crate) fn record_promotion(&mut self) {
        self.timer.record_promotion();
        if self.stats_enabled {
            self.promotions += 1;
        }
    }

    /// Snapshot of this context's counters, for observability. Zeroed out
    /// (aside from the tracker's own counts) if stats were disabled.
    pub(crate) fn stats(&self) -> WorkerStats {
        WorkerStats {
            operations: self.operations,
            polls: self.polls,
            promotions: self.promotions,
            tracker: self.tracker.stats(),
            oldest_outstanding_age: self.tracker.oldest_age(),
        }
    }
}

/// Default count-based polling interval: consult the timer every this-many
/// operations. Chosen so that `should_poll`'s amortized cost stays well
/// below a typical promotion cost without delaying promotion noticeably.
const DEFAULT_POLL_INTERVAL: u64 = 256;

/// Everything a worker carries alongside its own `WorkerContext`: the pool it
/// can dispatch promoted children to, and the executor-wide stats sink.
/// Bundled so `fork`'s promotion path doesn't need a second ambient lookup.
pub(crate) struct Installed {
    pub(crate) context: WorkerContext,
    pub(crate) pool: Arc<Pool>,
    pub(crate) stats: Arc<ExecutorStats>,
}

thread_local! {
    static CURRENT: RefCell<Option<Installed>> = const { RefCell::new(None) };
}

/// Installs `installed` as this thread's ambient worker binding, running
/// `body`, then uninstalling it (restoring whatever was installed before,
/// which is normally `None`. Nested `submit` calls are not expected, but
/// this keeps the invariant precise rather than silently dropping a parent
/// binding).
pub(crate) fn with_installed<R>(installed: Installed, body: impl FnOnce() -> R) -> (R, Installed) {
    let previous = CURRENT.with(|cell| cell.replace(Some(installed)));
    let result = body();
    let installed = CURRENT
        .with(|cell| cell.replace(previous))
        .expect("binding installed at the start of with_installed must still be present");
    (result, installed)
}

/// Looks up the ambient worker binding and hands it to `f`.
///
/// # Panics
///
/// Panics with a descriptive message if no context is installed on this
/// thread. Calling fork/join/invoke outside a `submit`/`submit_async` task is
/// a contract violation, not a recoverable error.
pub(crate) fn with_current<R>(f: impl FnOnce(&mut Installed) -> R) -> R {
    CURRENT.with(|cell| {
        let mut borrow = cell.borrow_mut();
        let installed = borrow.as_mut().unwrap_or_else(|| {
            panic!(
                "fork/join/invoke called with no WorkerContext installed on this thread; \
                 these may only be called from inside a closure submitted via Executor::submit \
                 or Executor::submit_async"
            )
        });
        f(installed)
    })
}

/// Whether a context is currently installed on this thread, without panicking.
#[must_use]
pub(crate) fn is_installed() -> bool {
    CURRENT.with(|cell| cell.borrow().is_some())
}
