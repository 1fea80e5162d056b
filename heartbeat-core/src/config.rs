use std::time::Duration;

use crate::error::ConfigError;

/// Default promotion cost assumed when a caller builds a config without
/// calibrating their machine (a conservative guess; callers that care should
/// plug in `heartbeat-calibrate`'s `calibrate()` output instead).
const DEFAULT_PROMOTION_COST: Duration = Duration::from_nanos(1_500);

/// Multiplier used to derive a heartbeat period from τ when neither
/// `heartbeat_period` nor `target_overhead_percent` is given, matching
/// `heartbeat-calibrate`'s `recommended_n = 20 * tau`.
const DEFAULT_PERIOD_MULTIPLE: f64 = 20.0;

/// Immutable, validated configuration for an [`Executor`](crate::Executor).
///
/// Built via [`ExecutorConfig::builder`], whose setter methods document the
/// recognized options and their constraints.
#[derive(Clone, Copy, Debug)]
pub struct ExecutorConfig {
    heartbeat_period: Duration,
    promotion_cost: Duration,
    worker_count: usize,
    stats_enabled: bool,
}

impl ExecutorConfig {
    /// Starts building a config with this crate's defaults: `worker_count`
    /// equal to the available parallelism, `stats_enabled = true`, and a
    /// heartbeat period of `20 * promotion_cost` unless overridden.
    #[must_use]
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }

    /// Minimum elapsed wall-clock time between admitted promotions on one worker (N).
    #[must_use]
    pub fn heartbeat_period(&self) -> Duration {
        self.heartbeat_period
    }

    /// Empirical cost of promoting a deferred task to an independent worker (τ).
    #[must_use]
    pub fn promotion_cost(&self) -> Duration {
        self.promotion_cost
    }

    /// Size of the worker pool.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Whether per-worker and executor-wide statistics counters are maintained.
    #[must_use]
    pub fn stats_enabled(&self) -> bool {
        self.stats_enabled
    }

    /// `τ / N`: the fraction of sequential work spent paying promotion
    /// overhead, in the worst case.
    #[must_use]
    pub fn expected_overhead_fraction(&self) -> f64 {
        self.promotion_cost.as_secs_f64() / self.heartbeat_period.as_secs_f64()
    }

    /// `1 + N/τ`: the upper bound on how much slower the parallel span may be
    /// versus the ideal fully-parallel span.
    #[must_use]
    pub fn span_inflation(&self) -> f64 {
        1.0 + self.heartbeat_period.as_secs_f64() / self.promotion_cost.as_secs_f64()
    }
}

/// Builder for [`ExecutorConfig`]. See the field-level docs on the setter
/// methods for the constraints validated at [`Self::build`].
#[derive(Clone, Copy, Debug)]
pub struct ExecutorConfigBuilder {
    heartbeat_period: Option<Duration>,
    promotion_cost: Duration,
    target_overhead_percent: Option<f64>,
    worker_count: usize,
    stats_enabled: bool,
}

impl Default for ExecutorConfigBuilder {
    fn default() -> Self {
        Self {
            heartbeat_period: None,
            promotion_cost: DEFAULT_PROMOTION_COST,
            target_overhead_percent: None,
            worker_count: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
            stats_enabled: true,
        }
    }
}

impl ExecutorConfigBuilder {
    /// Sets N directly. Conflicts with [`Self::target_overhead_percent`].
    #[must_use]
    pub fn heartbeat_period(mut self, period: Duration) -> Self {
        self.heartbeat_period = Some(period);
        self
    }

    /// Sets τ. Informational to the executor itself, but feeds the derived
    /// `expected_overhead_fraction`/`span_inflation` and, when
    /// `heartbeat_period` is left unset, the default N.
    #[must_use]
    pub fn promotion_cost(mut self, cost: Duration) -> Self {
        self.promotion_cost = cost;
        self
    }

    /// Convenience: derives N := (100/k) · τ. Conflicts with
    /// [`Self::heartbeat_period`].
    #[must_use]
    pub fn target_overhead_percent(mut self, percent: f64) -> Self {
        self.target_overhead_percent = Some(percent);
        self
    }

    /// Sets the worker pool size. Defaults to the platform's available parallelism.
    #[must_use]
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Whether to maintain statistics counters. Defaults to `true`.
    #[must_use]
    pub fn stats_enabled(mut self, enabled: bool) -> Self {
        self.stats_enabled = enabled;
        self
    }

    /// Validates and builds the config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if τ or N is non-positive, if N ≤ τ, if
    /// `worker_count` is zero, if both `heartbeat_period` and
    /// `target_overhead_percent` were set, or if `target_overhead_percent`
    /// lies outside (0, 100).
    pub fn build(self) -> Result<ExecutorConfig, ConfigError> {
        if self.promotion_cost.is_zero() {
            return Err(ConfigError::NonPositivePromotionCost);
        }

        let heartbeat_period = match (self.heartbeat_period, self.target_overhead_percent) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingHeartbeatPeriod),
            (Some(period), None) => period,
            (None, Some(k)) => {
                if !(k > 0.0 && k < 100.0) {
                    return Err(ConfigError::InvalidOverheadPercent(k));
                }
                self.promotion_cost.mul_f64(100.0 / k)
            }
            (None, None) => self.promotion_cost.mul_f64(DEFAULT_PERIOD_MULTIPLE),
        };

        if heartbeat_period.is_zero() {
            return Err(ConfigError::NonPositiveHeartbeatPeriod);
        }
        if heartbeat_period <= self.promotion_cost {
            return Err(ConfigError::HeartbeatPeriodNotGreaterThanPromotionCost {
                period: heartbeat_period,
                cost: self.promotion_cost,
            });
        }
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroWorkerCount);
        }

        Ok(ExecutorConfig {
            heartbeat_period,
            promotion_cost: self.promotion_cost,
            worker_count: self.worker_count,
            stats_enabled: self.stats_enabled,
        })
    }
}
