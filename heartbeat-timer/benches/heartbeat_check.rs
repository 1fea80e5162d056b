use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use heartbeat_timer::{PollingStrategy, Timer};

fn amortized_heartbeat_check(c: &mut Criterion) {
    c.bench_function("count_based_check_below_interval", |b| {
        let strategy = PollingStrategy::count_based(256).unwrap();
        let timer = Timer::new(Duration::from_secs(3600)).unwrap();
        b.iter(|| {
            strategy.record_operation();
            if strategy.should_poll() {
                strategy.record_poll();
                black_box(timer.should_promote());
            }
        });
    });
}

fn always_poll_heartbeat_check(c: &mut Criterion) {
    c.bench_function("always_poll_check", |b| {
        let strategy = PollingStrategy::always();
        let timer = Timer::new(Duration::from_secs(3600)).unwrap();
        b.iter(|| {
            strategy.record_operation();
            if strategy.should_poll() {
                strategy.record_poll();
                black_box(timer.should_promote());
            }
        });
    });
}

criterion_group!(benches, amortized_heartbeat_check, always_poll_heartbeat_check);
criterion_main!(benches);
