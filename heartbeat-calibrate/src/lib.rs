//! Calibration collaborator: measures the empirical cost of promoting a
//! deferred task to an independent worker (τ) on the machine it runs on, and
//! derives a recommended heartbeat period from it.
//!
//! This is a pure-function boundary with no lifecycle coupling to
//! [`heartbeat_core::Executor`]. It spins up its own short-lived executor to
//! take the measurement and tears it down again.

use std::time::{Duration, Instant};

use heartbeat_core::{Executor, ExecutorConfig};

/// Multiplier used to turn a measured τ into a recommended N, matching
/// `ExecutorConfig`'s own default when no explicit period is given.
const RECOMMENDED_PERIOD_MULTIPLE: u32 = 20;

/// Result of [`calibrate`]: the measured promotion cost and the period/
/// overhead figures derived from it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Calibration {
    /// Empirically measured promotion cost (τ).
    pub tau: Duration,
    /// Recommended heartbeat period, `20 * tau`.
    pub recommended_n: Duration,
    /// `100 * tau / recommended_n`, always 5% for the fixed 20x multiple,
    /// reported anyway so callers don't have to recompute it by hand.
    pub expected_overhead_percent: f64,
}

/// Empirically measures the mean cost of spawning a worker that runs an
/// empty body and is awaited, by round-tripping `iterations` trivial
/// `submit_async` calls through a single-worker executor and averaging.
///
/// A single worker is used deliberately: with more than one, the pool could
/// absorb dispatch latency across idle workers and underestimate the
/// per-promotion cost a real heartbeat decision pays.
///
/// # Panics
///
/// Panics if `iterations` is zero (there is nothing to average).
#[must_use]
pub fn measure_promotion_cost(iterations: u32) -> Duration {
    assert!(iterations > 0, "measure_promotion_cost requires at least one iteration");

    // A config with a very long heartbeat period is used purely as a
    // throwaway container for the single worker thread this measurement
    // dispatches onto; heartbeat scheduling itself plays no role here.
    let config = ExecutorConfig::builder()
        .heartbeat_period(Duration::from_secs(3600))
        .promotion_cost(Duration::from_nanos(1))
        .worker_count(1)
        .stats_enabled(false)
        .build()
        .expect("hardcoded calibration config is always valid");
    let executor = Executor::new(config);

    // Warm up: the first dispatch pays one-time thread-pool startup costs
    // (OS thread creation already happened in `Executor::new`, but the first
    // queue/condvar round trip can still be slower than steady state).
    executor.submit_async(|| ()).join();

    let start = Instant::now();
    for _ in 0..iterations {
        executor.submit_async(|| ()).join();
    }
    let elapsed = start.elapsed();

    executor.shutdown();
    let _ = executor.await_termination(Duration::from_secs(5));

    elapsed / iterations
}

/// Measures τ (via [`measure_promotion_cost`] with a fixed, reasonably
/// precise iteration count) and derives a recommended heartbeat period from
/// it: `recommended_n = 20 * tau`, the same multiple
/// `ExecutorConfig::builder()` falls back to when neither `heartbeat_period`
/// nor `target_overhead_percent` is set.
#[must_use]
pub fn calibrate() -> Calibration {
    const ITERATIONS: u32 = 1_000;

    let tau = measure_promotion_cost(ITERATIONS);
    let recommended_n = tau * RECOMMENDED_PERIOD_MULTIPLE;
    let expected_overhead_percent = 100.0 / f64::from(RECOMMENDED_PERIOD_MULTIPLE);

    tracing::info!(?tau, ?recommended_n, expected_overhead_percent, "calibration complete");

    Calibration {
        tau,
        recommended_n,
        expected_overhead_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_promotion_cost_returns_a_positive_duration() {
        let tau = measure_promotion_cost(20);
        assert!(tau > Duration::ZERO);
    }

    #[test]
    fn calibrate_derives_twenty_times_tau() {
        let calibration = calibrate();
        assert_eq!(calibration.recommended_n, calibration.tau * 20);
        assert!((calibration.expected_overhead_percent - 5.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "at least one iteration")]
    fn zero_iterations_panics() {
        measure_promotion_cost(0);
    }
}
