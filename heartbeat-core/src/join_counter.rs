use crate::loom::atomic::{AtomicUsize, Ordering};
use crate::loom::{Condvar, Mutex};

/// N-ary join barrier: `remaining` only decreases, `ready` becomes true
/// exactly when it reaches zero, and decrementing past zero is a contract
/// violation rather than a silently-ignored condition.
///
/// Useful for fanning a single fork/join task out into more than two
/// children (for example, "fork k children, then wait for all of them")
/// without hand-rolling the wait/notify dance around each call site.
pub struct JoinCounter {
    remaining: AtomicUsize,
    ready: Mutex<bool>,
    cv: Condvar,
}

impl JoinCounter {
    /// Creates a counter that becomes ready after `count` decrements.
    /// A `count` of zero is ready immediately.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            ready: Mutex::new(count == 0),
            cv: Condvar::new(),
        }
    }

    /// Decrements the counter by one.
    ///
    /// Exactly one caller observes the transition to zero and wakes every
    /// thread parked in [`Self::wait`].
    ///
    /// # Panics
    ///
    /// Panics if the counter is decremented below zero. This indicates a
    /// fork/join accounting bug (more joins than forks), not a data-dependent
    /// runtime condition, so it is treated the same as any other contract
    /// violation in this crate.
    pub fn decrement(&self) {
        let previous = self.remaining.fetch_update(Ordering::AcqRel, Ordering::Acquire, |value| {
            value.checked_sub(1)
        });

        match previous {
            Ok(1) => {
                let mut ready = crate::loom::lock(&self.ready);
                *ready = true;
                drop(ready);
                self.cv.notify_all();
            }
            Ok(_) => {}
            Err(0) => panic!("JoinCounter decremented below zero (contract violation)"),
            Err(_) => unreachable!("checked_sub only fails when the current value is zero"),
        }
    }

    /// Blocks the calling thread until `count` decrements have happened.
    pub fn wait(&self) {
        let mut ready = crate::loom::lock(&self.ready);
        while !*ready {
            ready = crate::loom::wait(&self.cv, ready);
        }
    }

    /// Current remaining count, without blocking.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Whether the counter has reached zero, without blocking.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *crate::loom::lock(&self.ready)
    }
}
