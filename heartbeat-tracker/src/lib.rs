//! The promotion tracker component of heartbeat scheduling.
//!
//! A [`PromotionTracker`] holds a worker's still-sequential forks in age
//! order. Every operation is O(1) and the tracker is **not** thread-safe: it
//! is meant to be owned exclusively by a single worker (see `heartbeat-core`'s
//! `WorkerContext`).
//!
//! The tracker is realized as an arena (`Vec<Slot<T>>`) addressed by a
//! generation-checked [`FrameId`] rather than a pointer-linked list, which is
//! the natural Rust equivalent of a doubly-linked mutable list under the
//! borrow checker (see the crate's design notes).

use std::time::{Duration, Instant};

mod arena;

pub use arena::FrameId;
use arena::{Arena, Node};

/// A still-sequential fork held by a [`PromotionTracker`].
///
/// Exactly one of "sitting in a tracker" or "detached" is ever true for a
/// given frame: once popped or promoted, the frame is returned by value and
/// no longer has a presence in the tracker's arena.
pub struct Frame<T> {
    payload: T,
    scope: String,
    created_at: Instant,
    promoted: bool,
}

impl<T> Frame<T> {
    /// The scope name this frame was forked under (for observability only).
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// When this frame was pushed onto a tracker.
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Whether this frame was elevated by `promote_oldest` (as opposed to
    /// popped by `pop_newest`/`remove`).
    #[must_use]
    pub fn promoted(&self) -> bool {
        self.promoted
    }

    /// Consumes the frame, returning its payload.
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Borrows the frame's payload.
    pub fn payload(&self) -> &T {
        &self.payload
    }
}

impl<T> std::fmt::Debug for Frame<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("scope", &self.scope)
            .field("created_at", &self.created_at)
            .field("promoted", &self.promoted)
            .finish_non_exhaustive()
    }
}

/// Cumulative, monotonically-increasing counters maintained by a
/// [`PromotionTracker`] across its lifetime (reset by [`PromotionTracker::clear`]).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TrackerStats {
    pub pushed: u64,
    pub popped: u64,
    pub promoted: u64,
}

/// Age-ordered, doubly-linked collection of promotable frames.
///
/// `head` is the newest frame (the one a well-nested program's next `join`
/// will look for); `tail` is the oldest (the one a heartbeat will promote).
pub struct PromotionTracker<T> {
    arena: Arena<T>,
    head: Option<usize>,
    tail: Option<usize>,
    size: usize,
    stats: TrackerStats,
}

impl<T> Default for PromotionTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for PromotionTracker<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromotionTracker")
            .field("size", &self.size)
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<T> PromotionTracker<T> {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            head: None,
            tail: None,
            size: 0,
            stats: TrackerStats::default(),
        }
    }

    /// Number of frames currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the tracker currently holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Cumulative push/pop/promote counters.
    #[must_use]
    pub fn stats(&self) -> TrackerStats {
        self.stats
    }

    /// Age of the oldest outstanding frame, if any.
    #[must_use]
    pub fn oldest_age(&self) -> Option<Duration> {
        let tail = self.tail?;
        let node = self.arena.get(tail).expect("tail index must be occupied");
        Some(Instant::now().saturating_duration_since(node.frame.created_at))
    }

    /// Pushes a new frame, detached by construction, at the head (newest
    /// position). Returns a handle that can later be used with
    /// [`Self::remove`].
    pub fn push(&mut self, payload: T, scope: impl Into<String>) -> FrameId {
        let frame = Frame {
            payload,
            scope: scope.into(),
            created_at: Instant::now(),
            promoted: false,
        };
        let node = Node {
            frame,
            newer: None,
            older: self.head,
        };
        let id = self.arena.insert(node);

        if let Some(old_head) = self.head {
            self.arena
                .get_mut(old_head)
                .expect("previous head must be occupied")
                .newer = Some(id.raw_index());
        } else {
            self.tail = Some(id.raw_index());
        }
        self.head = Some(id.raw_index());
        self.size += 1;
        self.stats.pushed += 1;

        tracing::trace!(frame = ?id, size = self.size, "pushed promotion frame");
        id
    }

    /// Removes and returns the newest frame (LIFO), or `None` if empty.
    pub fn pop_newest(&mut self) -> Option<(FrameId, Frame<T>)> {
        let head = self.head?;
        let (id, frame) = self.detach(head);
        self.stats.popped += 1;
        tracing::trace!(frame = ?id, size = self.size, "popped newest promotion frame");
        Some((id, frame))
    }

    /// Removes and returns the oldest frame (FIFO), marking it promoted, or
    /// `None` if empty.
    pub fn promote_oldest(&mut self) -> Option<(FrameId, Frame<T>)> {
        let tail = self.tail?;
        let (id, mut frame) = self.detach(tail);
        frame.promoted = true;
        self.stats.promoted += 1;
        tracing::trace!(frame = ?id, size = self.size, "promoted oldest outstanding frame");
        Some((id, frame))
    }

    /// Removes a specific frame in O(1), wherever it sits in the list.
    ///
    /// Returns `None` if `id` does not refer to a frame currently held by
    /// this tracker (already removed, or from a different tracker/generation).
    pub fn remove(&mut self, id: FrameId) -> Option<Frame<T>> {
        if !self.arena.contains(id) {
            return None;
        }
        let (_, frame) = self.detach(id.raw_index());
        self.stats.popped += 1;
        tracing::trace!(frame = ?id, size = self.size, "removed promotion frame");
        Some(frame)
    }

    /// Detaches and removes every frame, resetting size and links. Also
    /// zeroes the cumulative push/pop/promote counters.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
        self.size = 0;
        self.stats = TrackerStats::default();
    }

    /// Walks the list from tail to head, asserting the doubly-linked shape
    /// invariants (link symmetry, size, head/tail agreement).
    ///
    /// Intended for use by tests and debug assertions, not hot-path code.
    #[must_use]
    pub fn validate(&self) -> bool {
        if self.size == 0 {
            return self.head.is_none() && self.tail.is_none();
        }

        let Some(tail) = self.tail else {
            return false;
        };
        let Some(head) = self.head else {
            return false;
        };

        if self.size == 1 {
            let Some(node) = self.arena.get(tail) else {
                return false;
            };
            return tail == head && node.newer.is_none() && node.older.is_none();
        }

        if head == tail {
            return false;
        }

        let mut steps = 0usize;
        let mut cursor = Some(tail);
        let mut prev: Option<usize> = None;
        while let Some(idx) = cursor {
            let Some(node) = self.arena.get(idx) else {
                return false;
            };
            if node.older != prev {
                return false;
            }
            steps += 1;
            prev = Some(idx);
            cursor = node.newer;
        }

        steps == self.size && prev == Some(head)
    }

    fn detach(&mut self, idx: usize) -> (FrameId, Frame<T>) {
        let node = self.arena.get(idx).expect("index must be occupied");
        let newer = node.newer;
        let older = node.older;

        match newer {
            Some(n) => {
                self.arena.get_mut(n).expect("newer neighbor must be occupied").older = older;
            }
            None => self.head = older,
        }
        match older {
            Some(o) => {
                self.arena.get_mut(o).expect("older neighbor must be occupied").newer = newer;
            }
            None => self.tail = newer,
        }

        self.size -= 1;
        self.arena.remove(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(FrameId: Send, Sync, Copy);
    static_assertions::assert_impl_all!(PromotionTracker<i32>: Send);

    fn pushed_ids(tracker: &mut PromotionTracker<i32>, values: &[i32]) -> Vec<FrameId> {
        values
            .iter()
            .map(|v| tracker.push(*v, "test"))
            .collect()
    }

    #[test]
    fn empty_tracker_invariants() {
        let tracker: PromotionTracker<i32> = PromotionTracker::new();
        assert_eq!(tracker.len(), 0);
        assert!(tracker.is_empty());
        assert!(tracker.validate());
    }

    #[test]
    fn single_element_has_null_links() {
        let mut tracker = PromotionTracker::new();
        tracker.push(1, "a");
        assert_eq!(tracker.len(), 1);
        assert!(tracker.validate());
    }

    #[test]
    fn pop_newest_is_lifo() {
        let mut tracker = PromotionTracker::new();
        pushed_ids(&mut tracker, &[1, 2, 3]);

        let (_, f) = tracker.pop_newest().unwrap();
        assert_eq!(*f.payload(), 3);
        let (_, f) = tracker.pop_newest().unwrap();
        assert_eq!(*f.payload(), 2);
        let (_, f) = tracker.pop_newest().unwrap();
        assert_eq!(*f.payload(), 1);
        assert!(tracker.pop_newest().is_none());
        assert!(tracker.validate());
    }

    #[test]
    fn promote_oldest_is_fifo() {
        let mut tracker = PromotionTracker::new();
        pushed_ids(&mut tracker, &[1, 2, 3]);

        let (_, f) = tracker.promote_oldest().unwrap();
        assert_eq!(*f.payload(), 1);
        assert!(f.promoted());
        let (_, f) = tracker.promote_oldest().unwrap();
        assert_eq!(*f.payload(), 2);
        let (_, f) = tracker.promote_oldest().unwrap();
        assert_eq!(*f.payload(), 3);
        assert!(tracker.promote_oldest().is_none());
        assert!(tracker.validate());
    }

    #[test]
    fn size_one_promote_and_pop_coincide() {
        let mut tracker = PromotionTracker::new();
        let id = tracker.push(42, "only");

        // Either op, applied first, removes the sole element.
        let (popped_id, frame) = tracker.promote_oldest().unwrap();
        assert_eq!(popped_id, id);
        assert_eq!(*frame.payload(), 42);
        assert!(tracker.is_empty());
        assert!(tracker.validate());
    }

    #[test]
    fn remove_detaches_from_the_middle() {
        let mut tracker = PromotionTracker::new();
        let ids = pushed_ids(&mut tracker, &[1, 2, 3, 4]);

        let removed = tracker.remove(ids[1]).unwrap(); // value 2, middle of the list
        assert_eq!(*removed.payload(), 2);
        assert_eq!(tracker.len(), 3);
        assert!(tracker.validate());

        // removing the same id twice is a no-op, not a panic
        assert!(tracker.remove(ids[1]).is_none());
    }

    #[test]
    fn clear_resets_everything() {
        let mut tracker = PromotionTracker::new();
        pushed_ids(&mut tracker, &[1, 2, 3]);
        tracker.clear();

        assert!(tracker.is_empty());
        assert_eq!(tracker.stats(), TrackerStats::default());
        assert!(tracker.validate());
    }

    #[test]
    fn stats_conservation_under_mixed_operations() {
        let mut tracker = PromotionTracker::new();
        pushed_ids(&mut tracker, &(0..10).collect::<Vec<_>>());

        tracker.pop_newest();
        tracker.pop_newest();
        tracker.promote_oldest();
        tracker.promote_oldest();
        pushed_ids(&mut tracker, &[10, 11]);
        tracker.pop_newest();
        tracker.promote_oldest();

        let stats = tracker.stats();
        assert_eq!(stats.pushed, stats.popped + stats.promoted + tracker.len() as u64);
        assert!(tracker.validate());
    }

    #[test]
    fn stress_push_pop_promote_interleaved() {
        let mut tracker = PromotionTracker::new();
        let mut alive = std::collections::VecDeque::new();

        for round in 0..200 {
            let id = tracker.push(round, "stress");
            alive.push_back(id);

            if round % 3 == 0 {
                if let Some((id, _)) = tracker.pop_newest() {
                    alive.retain(|x| *x != id);
                }
            } else if round % 5 == 0 {
                if let Some((id, _)) = tracker.promote_oldest() {
                    alive.retain(|x| *x != id);
                }
            }
            assert!(tracker.validate());
        }

        assert_eq!(tracker.len(), alive.len());
        let stats = tracker.stats();
        assert_eq!(stats.pushed, stats.popped + stats.promoted + tracker.len() as u64);
    }
}
