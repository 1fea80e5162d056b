use std::fmt;

/// Construction-time validation failure.
///
/// Returned whenever a [`Timer`](crate::Timer) or
/// [`PollingStrategy`](crate::PollingStrategy) is asked to use a
/// non-positive period or interval.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InvalidConfig {
    /// The heartbeat period must be a positive duration.
    NonPositiveHeartbeatPeriod,
    /// The polling interval (operation count or duration) must be positive.
    NonPositivePollingInterval,
}

impl fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveHeartbeatPeriod => {
                f.write_str("heartbeat period must be greater than zero")
            }
            Self::NonPositivePollingInterval => {
                f.write_str("polling interval must be greater than zero")
            }
        }
    }
}

impl std::error::Error for InvalidConfig {}
