//! Loom/std shim, mirroring the pattern this lineage uses in its other
//! concurrency-sensitive crates (`mpsc-queue`, `spin`): under `cfg(loom)`,
//! the concurrency-sensitive primitives route through `loom`'s model checker
//! instead of the real `std::sync` so a test can exhaustively explore
//! thread interleavings; otherwise they're the ordinary `std` types.
//!
//! `loom::sync::Mutex::lock` has no poisoning and returns a guard directly,
//! unlike `std::sync::Mutex::lock`'s `LockResult`. [`lock`] hides that
//! difference so call sites don't need a `#[cfg(loom)]` of their own.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(loom)] {
        pub(crate) use loom::sync::{Arc, Condvar, Mutex, MutexGuard};
        pub(crate) use loom::sync::atomic;
        pub(crate) use loom::thread;
        pub(crate) use loom::model;

        #[inline]
        pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
            mutex.lock()
        }

        #[inline]
        pub(crate) fn wait<'a, T>(cv: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
            cv.wait(guard)
        }
    } else {
        pub(crate) use std::sync::{Arc, Condvar, Mutex, MutexGuard};
        pub(crate) use std::sync::atomic;
        pub(crate) use std::thread;

        #[inline]
        pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
            mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
        }

        #[inline]
        pub(crate) fn wait<'a, T>(cv: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
            cv.wait(guard).unwrap_or_else(std::sync::PoisonError::into_inner)
        }

        #[cfg(test)]
        #[inline(always)]
        pub(crate) fn model<R>(f: impl FnOnce() -> R) -> R {
            f()
        }
    }
}
