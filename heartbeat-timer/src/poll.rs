use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::InvalidConfig;

/// The smallest time-based polling interval this crate will accept, per the
/// tuning rule that recommends ~N/10 with a floor of 1 microsecond.
pub const MIN_TIME_BASED_INTERVAL: Duration = Duration::from_micros(1);

/// Decides when it is worth *consulting* the [`Timer`](crate::Timer), so that
/// the (already cheap) cost of `should_promote` is itself amortized.
///
/// `should_poll` must be cheap; `record_poll` is only called when
/// `should_poll` returned `true` and the caller actually went on to read the
/// timer.
#[derive(Debug)]
pub enum PollingStrategy {
    /// Polls once every `interval` calls to [`Self::should_poll`].
    Count {
        interval: u64,
        counter: AtomicU64,
    },
    /// Polls once every `interval` of wall-clock time.
    Time {
        interval: Duration,
        last_poll: std::sync::Mutex<Instant>,
    },
    /// Polls unconditionally. Correct but un-amortized; useful for
    /// calibration and tests that want deterministic promotion timing.
    Always,
}

impl PollingStrategy {
    /// A count-based strategy: `should_poll` returns `true` once every
    /// `interval` calls.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfig::NonPositivePollingInterval`] if `interval` is
    /// zero.
    pub fn count_based(interval: u64) -> Result<Self, InvalidConfig> {
        if interval == 0 {
            return Err(InvalidConfig::NonPositivePollingInterval);
        }
        Ok(Self::Count {
            interval,
            counter: AtomicU64::new(0),
        })
    }

    /// A time-based strategy: `should_poll` returns `true` once at least
    /// `interval` has elapsed since the last recorded poll.
    ///
    /// The recommended interval is ~N/10 with a floor of
    /// [`MIN_TIME_BASED_INTERVAL`]; this constructor does not enforce the
    /// recommendation, only that `interval` is positive.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfig::NonPositivePollingInterval`] if `interval` is
    /// zero.
    pub fn time_based(interval: Duration) -> Result<Self, InvalidConfig> {
        if interval.is_zero() {
            return Err(InvalidConfig::NonPositivePollingInterval);
        }
        Ok(Self::Time {
            interval,
            last_poll: std::sync::Mutex::new(Instant::now()),
        })
    }

    /// A strategy that always recommends polling. Correct, never amortized.
    #[must_use]
    pub fn always() -> Self {
        Self::Always
    }

    /// Cheap check: is it time to consult the timer?
    #[must_use]
    pub fn should_poll(&self) -> bool {
        match self {
            Self::Count { interval, counter } => counter.load(Ordering::Relaxed) >= *interval,
            Self::Time {
                interval,
                last_poll,
            } => {
                let last = *last_poll.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                Instant::now().saturating_duration_since(last) >= *interval
            }
            Self::Always => true,
        }
    }

    /// Records that a poll happened, resetting whatever internal accounting
    /// this strategy tracks.
    ///
    /// Must only be called after a `true` result from [`Self::should_poll`]
    /// that was actually acted upon.
    pub fn record_poll(&self) {
        match self {
            Self::Count { counter, .. } => counter.store(0, Ordering::Relaxed),
            Self::Time { last_poll, .. } => {
                let mut guard = last_poll.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                *guard = Instant::now();
            }
            Self::Always => {}
        }
    }

    /// Records one operation, for count-based strategies. No-op for
    /// time-based and always-poll strategies.
    pub fn record_operation(&self) {
        if let Self::Count { counter, .. } = self {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Clears whatever internal accounting this strategy tracks, without
    /// implying a poll happened.
    pub fn reset(&self) {
        match self {
            Self::Count { counter, .. } => counter.store(0, Ordering::Relaxed),
            Self::Time { last_poll, .. } => {
                let mut guard = last_poll.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                *guard = Instant::now();
            }
            Self::Always => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(PollingStrategy: Send, Sync);

    #[test]
    fn rejects_zero_interval() {
        assert_eq!(
            PollingStrategy::count_based(0).unwrap_err(),
            InvalidConfig::NonPositivePollingInterval
        );
        assert_eq!(
            PollingStrategy::time_based(Duration::ZERO).unwrap_err(),
            InvalidConfig::NonPositivePollingInterval
        );
    }

    #[test]
    fn count_based_polls_every_n_operations() {
        let strategy = PollingStrategy::count_based(3).unwrap();

        for _ in 0..2 {
            strategy.record_operation();
            assert!(!strategy.should_poll());
        }

        strategy.record_operation();
        assert!(strategy.should_poll());

        strategy.record_poll();
        assert!(!strategy.should_poll());
    }

    #[test]
    fn time_based_polls_after_interval() {
        let strategy = PollingStrategy::time_based(Duration::from_millis(5)).unwrap();
        assert!(!strategy.should_poll());

        std::thread::sleep(Duration::from_millis(10));
        assert!(strategy.should_poll());

        strategy.record_poll();
        assert!(!strategy.should_poll());
    }

    #[test]
    fn always_always_polls() {
        let strategy = PollingStrategy::always();
        assert!(strategy.should_poll());
        strategy.record_poll();
        assert!(strategy.should_poll());
    }
}
