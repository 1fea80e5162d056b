//! The heartbeat timer and polling-strategy components of heartbeat scheduling.
//!
//! A [`Timer`] answers one question cheaply: "has at least `heartbeat_period`
//! elapsed since the last promotion?". A [`PollingStrategy`] decides how often
//! that question is worth asking, so that the cost of *consulting* the timer
//! stays amortized relative to the promotion cost `τ` it is trying to bound.

mod error;
mod poll;
mod timer;

pub use error::InvalidConfig;
pub use poll::PollingStrategy;
pub use timer::Timer;
