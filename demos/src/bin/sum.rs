//! Divide-and-conquer range sum via fork/join: a coarser-grained workload
//! than `fib`, useful for eyeballing how the `threshold` (the point at which
//! a sub-range stops splitting) interacts with the heartbeat period's
//! promotion rate.

use std::time::Duration;

use heartbeat_core::{fork, join, Executor, ExecutorConfig};

fn sum_range(lo: u64, hi: u64, threshold: u64) -> u64 {
    if hi - lo <= threshold {
        return (lo..=hi).sum();
    }
    let mid = lo + (hi - lo) / 2;
    let left = fork(move || sum_range(lo, mid, threshold));
    let right = sum_range(mid + 1, hi, threshold);
    join(left) + right
}

fn main() {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let hi: u64 = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(1_000_000);
    let threshold: u64 = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(1_000);

    let executor = Executor::new(
        ExecutorConfig::builder()
            .target_overhead_percent(5.0)
            .build()
            .expect("5% is within (0, 100)"),
    );

    let result = executor.submit(move || sum_range(1, hi, threshold));
    let expected = hi * (hi + 1) / 2;
    println!("sum(1..={hi}) with threshold {threshold} = {result} (expected {expected})");
    assert_eq!(result, expected, "divide-and-conquer sum disagreed with the closed form");

    let stats = executor.stats();
    println!("promotion rate (workers spawned / tasks submitted): {:.4}%", {
        if stats.tasks_submitted == 0 {
            0.0
        } else {
            100.0 * stats.workers_spawned as f64 / stats.tasks_submitted as f64
        }
    });

    executor.shutdown();
    executor.await_termination(Duration::from_secs(30));
}
