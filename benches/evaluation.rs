use std::sync::Arc;
use std::hint::black_box;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::Utc;
use geonote::monitor::Evaluator;
use geonote::notify::{InMemoryNotificationService, ReminderScheduler};
use geonote::{distance, Coordinate, GeofenceTarget, InMemoryTargetStore, OwnerId};

fn make_store(n: usize) -> InMemoryTargetStore {
    // Targets on a ~1 km grid around Berlin; none contain the query point.
    let side = (n as f64).sqrt().ceil() as usize;
    let targets = (0..n).map(|i| {
        let lat = 52.0 + (i / side) as f64 * 0.01;
        let lon = 13.0 + (i % side) as f64 * 0.01;
        GeofenceTarget::new(
            OwnerId::new(format!("note-{i}")).unwrap(),
            Coordinate::new(lat, lon).unwrap(),
            200.0,
            format!("Note {i}"),
        )
        .unwrap()
    });
    InMemoryTargetStore::with_targets(targets)
}

fn bench_distance(c: &mut Criterion) {
    let a = Coordinate::new(40.0, -75.0).unwrap();
    let b = Coordinate::new(40.0009, -75.0011).unwrap();
    c.bench_function("geo/haversine", |bench| {
        bench.iter(|| distance(black_box(a), black_box(b)));
    });
}

fn bench_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("monitor/pass");
    let query = Coordinate::new(51.5, 12.5).unwrap();

    for n in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            // Setup excluded from timing.
            b.iter_custom(|iters| {
                let store = make_store(n);
                let scheduler = ReminderScheduler::new(Arc::new(InMemoryNotificationService::new()));
                let mut evaluator = Evaluator::new();

                let start = Instant::now();
                for _ in 0..iters {
                    black_box(evaluator.evaluate(query, &store, &scheduler, Utc::now()));
                }
                start.elapsed()
            });
        });
    }
    group.finish();
}

criterion_group!(evaluation, bench_distance, bench_pass);
criterion_main!(evaluation);
