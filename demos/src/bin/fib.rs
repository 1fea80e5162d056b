//! Recursive Fibonacci via fork/join: demonstrates that heartbeat scheduling
//! promotes only the oldest outstanding fork, not every one, while still
//! returning the same values a purely sequential recursion would.

use std::time::Duration;

use heartbeat_core::{fork, join, Executor, ExecutorConfig};

fn fib(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let left = fork(move || fib(n - 1));
    let right = fib(n - 2);
    join(left) + right
}

fn main() {
    tracing_subscriber::fmt::init();

    let n: u64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(30);

    let calibration = heartbeat_calibrate_or_default();
    let executor = Executor::new(
        ExecutorConfig::builder()
            .promotion_cost(calibration.tau)
            .heartbeat_period(calibration.recommended_n)
            .build()
            .expect("builder-derived config is always valid"),
    );

    let result = executor.submit(move || fib(n));
    println!("fib({n}) = {result}");

    let stats = executor.stats();
    println!(
        "tasks submitted: {}, workers spawned: {}",
        stats.tasks_submitted, stats.workers_spawned
    );

    executor.shutdown();
    executor.await_termination(Duration::from_secs(30));
}

/// Calibrating on every demo run would dominate the runtime of small `n`;
/// fall back to a conservative guess if the quick measurement looks wrong
/// (e.g. under heavy load from other tests running concurrently).
fn heartbeat_calibrate_or_default() -> heartbeat_calibrate::Calibration {
    let calibration = heartbeat_calibrate::calibrate();
    if calibration.tau > Duration::ZERO {
        calibration
    } else {
        heartbeat_calibrate::Calibration {
            tau: Duration::from_nanos(1_500),
            recommended_n: Duration::from_nanos(30_000),
            expected_overhead_percent: 5.0,
        }
    }
}
