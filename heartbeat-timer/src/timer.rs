use std::time::{Duration, Instant};

use crate::error::InvalidConfig;

/// Monotonic-clock gate answering "has the heartbeat period elapsed since the
/// last promotion?".
///
/// A `Timer` is the authority for the τ/N overhead guarantee: a promotion may
/// occur only when at least `heartbeat_period` has elapsed since the previous
/// promotion *on this worker*, bounding the number of promotions admitted in
/// any window of duration Δ to `⌊Δ / heartbeat_period⌋ + 1`.
#[derive(Debug)]
pub struct Timer {
    last_promotion: Instant,
    heartbeat_period: Duration,
    credits: u64,
}

impl Timer {
    /// Creates a new `Timer` with the given heartbeat period, initialized as
    /// though a promotion had just occurred (`now()`).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfig::NonPositiveHeartbeatPeriod`] if `heartbeat_period`
    /// is zero.
    pub fn new(heartbeat_period: Duration) -> Result<Self, InvalidConfig> {
        if heartbeat_period.is_zero() {
            return Err(InvalidConfig::NonPositiveHeartbeatPeriod);
        }

        Ok(Self {
            last_promotion: Instant::now(),
            heartbeat_period,
            credits: 0,
        })
    }

    /// Returns `true` iff at least `heartbeat_period` has elapsed since the
    /// last recorded promotion.
    ///
    /// Clock non-monotonicity (which should not occur on a correct monotonic
    /// source) can only cause a spurious `false`; it never panics.
    #[must_use]
    pub fn should_promote(&self) -> bool {
        Instant::now().saturating_duration_since(self.last_promotion) >= self.heartbeat_period
    }

    /// Records that a promotion just occurred: resets the elapsed clock and
    /// clears accumulated polling credits.
    pub fn record_promotion(&mut self) {
        self.last_promotion = Instant::now();
        self.credits = 0;
        tracing::trace!(heartbeat_period = ?self.heartbeat_period, "recorded promotion");
    }

    /// Adds `n` polling credits.
    ///
    /// Credits are bookkeeping for count-based polling strategies; they do
    /// not themselves affect [`Self::should_promote`].
    pub fn add_credits(&mut self, n: u64) {
        self.credits = self.credits.saturating_add(n);
    }

    /// Current accumulated polling credits.
    #[must_use]
    pub fn credits(&self) -> u64 {
        self.credits
    }

    /// Equivalent to [`Self::record_promotion`]; also the entry point used to
    /// logically clear any calibration state tied to this timer.
    pub fn reset(&mut self) {
        self.record_promotion();
    }

    /// The configured heartbeat period.
    #[must_use]
    pub fn heartbeat_period(&self) -> Duration {
        self.heartbeat_period
    }

    /// Time elapsed since the last recorded promotion.
    #[must_use]
    pub fn elapsed_since_promotion(&self) -> Duration {
        Instant::now().saturating_duration_since(self.last_promotion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(Timer: Send, Sync);

    #[test]
    fn rejects_zero_period() {
        assert_eq!(
            Timer::new(Duration::ZERO).unwrap_err(),
            InvalidConfig::NonPositiveHeartbeatPeriod
        );
    }

    #[test]
    fn does_not_promote_immediately() {
        let timer = Timer::new(Duration::from_millis(50)).unwrap();
        assert!(!timer.should_promote());
    }

    #[test]
    fn promotes_after_period_elapses() {
        let timer = Timer::new(Duration::from_millis(5)).unwrap();
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.should_promote());
    }

    #[test]
    fn record_promotion_resets_the_clock() {
        let mut timer = Timer::new(Duration::from_millis(5)).unwrap();
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.should_promote());

        timer.record_promotion();
        assert!(!timer.should_promote());
    }

    #[test]
    fn credits_accumulate_and_reset() {
        let mut timer = Timer::new(Duration::from_millis(5)).unwrap();
        timer.add_credits(3);
        timer.add_credits(4);
        assert_eq!(timer.credits(), 7);

        timer.record_promotion();
        assert_eq!(timer.credits(), 0);
    }

    #[test]
    fn monotonicity_cannot_toggle_without_a_promotion() {
        // should_promote() can only go true -> false via record_promotion/reset.
        let timer = Timer::new(Duration::from_millis(5)).unwrap();
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.should_promote());
        // no mutation happened in between: still true
        assert!(timer.should_promote());
    }
}
