use std::fmt;
use std::time::Duration;

/// Construction-time validation failure for an [`ExecutorConfig`](crate::ExecutorConfig).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// `promotion_cost` (τ) was zero.
    NonPositivePromotionCost,
    /// `heartbeat_period` (N) was zero.
    NonPositiveHeartbeatPeriod,
    /// N must be strictly greater than τ so the promotion rate bound is meaningful.
    HeartbeatPeriodNotGreaterThanPromotionCost { period: Duration, cost: Duration },
    /// Both an explicit `heartbeat_period` and a `target_overhead_percent` were given;
    /// only one may determine N.
    ConflictingHeartbeatPeriod,
    /// `target_overhead_percent` must lie in (0, 100).
    InvalidOverheadPercent(f64),
    /// `worker_count` was zero.
    ZeroWorkerCount,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositivePromotionCost => f.write_str("promotion cost must be greater than zero"),
            Self::NonPositiveHeartbeatPeriod => f.write_str("heartbeat period must be greater than zero"),
            Self::HeartbeatPeriodNotGreaterThanPromotionCost { period, cost } => write!(
                f,
                "heartbeat period ({period:?}) must be greater than promotion cost ({cost:?})"
            ),
            Self::ConflictingHeartbeatPeriod => f.write_str(
                "heartbeat_period and target_overhead_percent cannot both be set",
            ),
            Self::InvalidOverheadPercent(k) => {
                write!(f, "target_overhead_percent must lie in (0, 100), got {k}")
            }
            Self::ZeroWorkerCount => f.write_str("worker_count must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}
