use std::time::Duration;

use heartbeat_core::{fork, invoke, join, Executor, ExecutorConfig};

/// Installs a `tracing` subscriber for this process the first time it's
/// called, so `RUST_LOG=trace cargo test` surfaces the push/pop/promote and
/// worker lifecycle events these tests exercise. A second call is a no-op.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn executor_with_period(period: Duration) -> Executor {
    Executor::new(
        ExecutorConfig::builder()
            .heartbeat_period(period)
            .promotion_cost(Duration::from_nanos(100))
            .worker_count(4)
            .build()
            .expect("valid config"),
    )
}

fn fib(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let left = fork(move || fib(n - 1));
    let right = fib(n - 2);
    join(left) + right
}

fn sum_range(lo: u64, hi: u64, threshold: u64) -> u64 {
    if hi - lo <= threshold {
        return (lo..=hi).sum();
    }
    let mid = lo + (hi - lo) / 2;
    let left = fork(move || sum_range(lo, mid, threshold));
    let right = sum_range(mid + 1, hi, threshold);
    join(left) + right
}

/// A heartbeat period long enough that, in practice, no fork is ever
/// promoted during these small programs. Exercises the purely sequential
/// path end to end.
#[test]
fn fib_sequential_path_matches_the_closed_form() {
    init_tracing();
    let executor = executor_with_period(Duration::from_secs(10));
    for (n, expected) in [(0u64, 0u64), (1, 1), (10, 55), (15, 610), (20, 6765)] {
        assert_eq!(executor.submit(move || fib(n)), expected, "fib({n})");
    }
}

/// A heartbeat period short enough that most forks get promoted across the
/// worker pool. Exercises the parallel path, and crucially, that the result
/// is identical regardless of which forks were promoted.
#[test]
fn fib_parallel_path_matches_the_closed_form() {
    let executor = executor_with_period(Duration::from_nanos(200));
    for (n, expected) in [(0u64, 0u64), (1, 1), (10, 55), (15, 610), (20, 6765)] {
        assert_eq!(executor.submit(move || fib(n)), expected, "fib({n})");
    }
}

#[test]
fn divide_and_conquer_sum_matches_the_closed_form() {
    let executor = executor_with_period(Duration::from_micros(1));
    assert_eq!(executor.submit(|| sum_range(1, 10, 2)), 55);
    assert_eq!(executor.submit(|| sum_range(1, 1000, 50)), 500_500);
}

#[test]
fn invoke_collapses_fork_and_join() {
    let executor = executor_with_period(Duration::from_secs(10));
    assert_eq!(executor.submit(|| invoke(|| 21) * 2), 42);
}

#[test]
fn config_target_overhead_percent_matches_the_worked_example() {
    let config = ExecutorConfig::builder()
        .promotion_cost(Duration::from_nanos(1500))
        .target_overhead_percent(5.0)
        .build()
        .expect("valid config");

    assert_eq!(config.heartbeat_period(), Duration::from_nanos(30_000));
    assert!((config.expected_overhead_fraction() - 0.05).abs() < 1e-9);
    assert!((config.span_inflation() - 21.0).abs() < 1e-9);
}

#[test]
fn submit_async_can_itself_fork_and_join() {
    let executor = executor_with_period(Duration::from_micros(1));
    let handle = executor.submit_async(|| {
        let children: Vec<_> = (0..8i64).map(|i| fork(move || i * i)).collect();
        children.into_iter().map(join).sum::<i64>()
    });
    assert_eq!(handle.join(), (0..8i64).map(|i| i * i).sum::<i64>());
}
