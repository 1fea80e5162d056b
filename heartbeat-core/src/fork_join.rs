use std::sync::Arc;

use heartbeat_tracker::FrameId;

use crate::context::{self, Decision, Installed, WorkerContext};
use crate::slot::{PromotableSlot, TaskSlot};

/// Handle to a child forked with [`fork`]. Carries the child's own result
/// slot plus the `FrameId` it was pushed under, so [`join`] can tell whether
/// the frame is still sitting in the tracker (still sequential) or was
/// already removed by a heartbeat's `promote_oldest` (running, or done,
/// elsewhere).
///
/// Consumed by value in `join`, which is how this crate enforces "each child
/// may be forked once and joined at most once" structurally, rather than
/// with a runtime flag. Rust's ownership model does this for free.
pub struct Forked<T> {
    id: FrameId,
    slot: Arc<TaskSlot<T>>,
}

/// Declares `child` for possibly parallel execution.
///
/// Pushes a [`PromotionFrame`](heartbeat_tracker::Frame) wrapping `child`
/// onto the current worker's tracker, then checks the heartbeat. If the
/// heartbeat clears a promotion, the *oldest* outstanding frame on this
/// worker is elevated to an independent worker via the pool. That frame may
/// or may not be this call's own child.
///
/// # Panics
///
/// Panics if called outside a task running under [`crate::Executor::submit`]
/// or [`crate::Executor::submit_async`]. With no `WorkerContext` installed on
/// this thread, this is a contract violation.
pub fn fork<F, T>(child: F) -> Forked<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    context::with_current(|installed| {
        let slot = Arc::new(TaskSlot::pending(Box::new(child)));
        let erased: Arc<dyn PromotableSlot> = Arc::clone(&slot) as Arc<dyn PromotableSlot>;
        let id = installed.context.tracker_mut().push(erased, "fork");

        if installed.context.check_heartbeat() == Decision::Promote {
            promote_and_dispatch(installed);
        }

        Forked { id, slot }
    })
}

/// Waits for a previously forked child to complete and consumes its result.
///
/// If the frame is still sitting in the tracker (no heartbeat promoted it
/// yet), it is removed and run inline on the current worker, the
/// "sequential by default" path. If it was already promoted, this blocks on
/// the shared result slot, which some pool worker is (or will be) running.
///
/// # Panics
///
/// Resumes the child's panic (via `std::panic::resume_unwind`) if the child
/// panicked, preserving the original payload, so join returns the same value
/// a direct call to the closure would have produced even in the panicking
/// case. Also panics (contract violation) if called with no `WorkerContext`
/// installed.
pub fn join<T: Send + 'static>(forked: Forked<T>) -> T {
    let Forked { id, slot } = forked;

    let still_sequential = context::with_current(|installed| installed.context.tracker_mut().remove(id).is_some());
    if still_sequential {
        PromotableSlot::run(&*slot);
    }

    match slot.wait() {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Equivalent to `join(fork(child))`: forks `child` and immediately waits
/// for it, collapsing the common "run this, possibly in parallel, and use
/// its result right here" shape into one call.
///
/// # Panics
///
/// Same as [`fork`] and [`join`].
pub fn invoke<F, T>(child: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    join(fork(child))
}

/// Elevates the oldest outstanding frame on this worker to an independent
/// pool worker: pops it via `promote_oldest`, records the promotion against
/// the timer, and dispatches a job that installs a **freshly initialized**
/// context (never the forking worker's) before running the promoted
/// closure.
fn promote_and_dispatch(installed: &mut Installed) {
    let Some((_, frame)) = installed.context.tracker_mut().promote_oldest() else {
        return;
    };
    installed.context.record_promotion();

    let payload = frame.into_payload();
    let pool = Arc::clone(&installed.pool);
    let stats = Arc::clone(&installed.stats);
    let config = Arc::clone(installed.context.config());

    stats.record_submitted();
    pool.dispatch(Box::new(move || {
        let fresh = WorkerContext::fresh(Arc::clone(&config));
        let promoted_stats = Arc::clone(&stats);
        let next = Installed {
            context: fresh,
            pool: Arc::clone(&pool),
            stats: promoted_stats,
        };
        let (panicked, _next) = context::with_installed(next, move || PromotableSlot::run(&*payload));
        stats.record_completed(panicked);
    }));
}
