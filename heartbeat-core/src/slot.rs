use std::any::Any;
use std::panic::AssertUnwindSafe;

use crate::loom::{Condvar, Mutex};

/// The payload of a failed task: whatever `catch_unwind` captured.
pub type Panic = Box<dyn Any + Send + 'static>;

enum SlotState<T> {
    /// Holds the child's closure until something runs it (sequentially, inline
    /// at `join`, or on a pool worker after promotion).
    Pending(Option<Box<dyn FnOnce() -> T + Send>>),
    /// The closure has been taken out and is executing; nothing is returned yet.
    Running,
    /// Single-assignment result: either the value or the panic payload.
    Done(Result<T, Panic>),
}

/// Shared state backing one forked task: a single-assignment result/error
/// slot sitting behind the suspended closure until something runs it.
///
/// A `TaskSlot<T>` is reachable from two places: the [`Forked<T>`](crate::Forked)
/// handle returned by `fork`, and, for as long as the frame sits in the
/// tracker, the type-erased [`PromotableSlot`] trait object stored there.
/// Exactly one of those two paths ever calls [`Self::run`].
pub(crate) struct TaskSlot<T> {
    state: Mutex<SlotState<T>>,
    cv: Condvar,
}

impl<T> TaskSlot<T> {
    pub(crate) fn pending(closure: Box<dyn FnOnce() -> T + Send>) -> Self {
        Self {
            state: Mutex::new(SlotState::Pending(Some(closure))),
            cv: Condvar::new(),
        }
    }

    /// Runs the pending closure (if it hasn't already been taken by a racing
    /// caller) under `catch_unwind`, then publishes the result and wakes any
    /// waiters. A no-op (returning `false`) if the closure was already taken.
    ///
    /// Returns whether the closure panicked, so callers can feed executor-wide
    /// panic stats without re-locking to peek at the published result.
    fn run(&self) -> bool {
        let closure = {
            let mut guard = crate::loom::lock(&self.state);
            match std::mem::replace(&mut *guard, SlotState::Running) {
                SlotState::Pending(Some(closure)) => closure,
                other => {
                    // Already taken by a racing caller (shouldn't happen given
                    // the tracker's single-removal guarantee, but run() must
                    // stay idempotent rather than double-execute).
                    *guard = other;
                    return false;
                }
            }
        };

        let result = std::panic::catch_unwind(AssertUnwindSafe(closure));
        let panicked = result.is_err();

        let mut guard = crate::loom::lock(&self.state);
        *guard = SlotState::Done(result);
        drop(guard);
        self.cv.notify_all();

        panicked
    }

    /// Blocks the calling worker until the result is published, then
    /// consumes it. Must be called at most once per slot (enforced by
    /// `Forked<T>` being consumed by value in `join`).
    pub(crate) fn wait(&self) -> Result<T, Panic> {
        let mut guard = crate::loom::lock(&self.state);
        loop {
            match &*guard {
                SlotState::Done(_) => break,
                _ => {
                    guard = crate::loom::wait(&self.cv, guard);
                }
            }
        }
        match std::mem::replace(&mut *guard, SlotState::Running) {
            SlotState::Done(result) => result,
            _ => unreachable!("state was observed Done under the same lock"),
        }
    }
}

/// Type-erased handle to a [`TaskSlot`], so a [`PromotionTracker`](heartbeat_tracker::PromotionTracker)
/// can hold children of differing result types side by side.
pub(crate) trait PromotableSlot: Send + Sync {
    fn run(&self) -> bool;
}

impl<T: Send + 'static> PromotableSlot for TaskSlot<T> {
    fn run(&self) -> bool {
        TaskSlot::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_publishes_the_result_and_wait_consumes_it() {
        let slot = TaskSlot::pending(Box::new(|| 7));
        assert!(!PromotableSlot::run(&slot));
        assert_eq!(slot.wait().unwrap(), 7);
    }

    #[test]
    fn run_captures_a_panic_and_wait_resumes_it() {
        let slot: TaskSlot<i32> = TaskSlot::pending(Box::new(|| panic!("boom")));
        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));
        let panicked = PromotableSlot::run(&slot);
        std::panic::set_hook(prev_hook);
        assert!(panicked);
        assert!(slot.wait().is_err());
    }

    #[test]
    fn second_run_is_a_no_op() {
        let slot = TaskSlot::pending(Box::new(|| 1));
        assert!(!PromotableSlot::run(&slot));
        assert!(!PromotableSlot::run(&slot));
        assert_eq!(slot.wait().unwrap(), 1);
    }
}
