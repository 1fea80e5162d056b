use criterion::{black_box, criterion_group, criterion_main, Criterion};
use heartbeat_tracker::PromotionTracker;

fn push_pop_newest(c: &mut Criterion) {
    c.bench_function("push_then_pop_newest", |b| {
        let mut tracker = PromotionTracker::new();
        b.iter(|| {
            let id = tracker.push(black_box(1u64), "bench");
            black_box(tracker.pop_newest());
            black_box(id)
        });
    });
}

fn push_promote_oldest(c: &mut Criterion) {
    c.bench_function("push_then_promote_oldest", |b| {
        let mut tracker = PromotionTracker::new();
        b.iter(|| {
            tracker.push(black_box(1u64), "bench");
            black_box(tracker.promote_oldest())
        });
    });
}

fn promote_oldest_under_contention(c: &mut Criterion) {
    c.bench_function("promote_oldest_with_1000_outstanding", |b| {
        let mut tracker = PromotionTracker::new();
        for i in 0..1000u64 {
            tracker.push(i, "bench");
        }
        b.iter(|| {
            let popped = tracker.promote_oldest();
            tracker.push(black_box(0u64), "bench");
            black_box(popped)
        });
    });
}

criterion_group!(benches, push_pop_newest, push_promote_oldest, promote_oldest_under_contention);
criterion_main!(benches);
