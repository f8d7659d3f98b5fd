use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use accesskey_fees::{usd_fee_to_rate, DebtCheckpoint, FeeSchedule};
use accesskey_types::Timestamp;

fn make_schedule_with_points(n: usize) -> FeeSchedule {
    let mut schedule = FeeSchedule::new(100, Timestamp::new(0));
    for i in 1..n {
        schedule
            .push_rate(100 + i as u128, Timestamp::new(i as u64 * 1000))
            .unwrap();
    }
    schedule
}

fn bench_schedule_accrual(c: &mut Criterion) {
    let mut group = c.benchmark_group("fee_schedule");

    for point_count in [1, 10, 100, 1000] {
        let schedule = make_schedule_with_points(point_count);
        let now = Timestamp::new(point_count as u64 * 1000 + 500);

        group.bench_with_input(
            BenchmarkId::new("accrued_since", point_count),
            &point_count,
            |b, _| {
                b.iter(|| black_box(schedule.accrued_since(black_box(Timestamp::new(250)), black_box(now))));
            },
        );
    }

    group.finish();
}

fn bench_debt_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("debt_at");
    let checkpoint = DebtCheckpoint::new(Timestamp::new(0));

    for point_count in [1, 10, 100, 1000] {
        let schedule = make_schedule_with_points(point_count);
        let now = Timestamp::new(point_count as u64 * 1000 + 500);

        group.bench_with_input(BenchmarkId::new("debt_at", point_count), &point_count, |b, _| {
            b.iter(|| black_box(checkpoint.debt_at(Some(black_box(&schedule)), black_box(now))));
        });
    }

    group.finish();
}

fn bench_checkpoint(c: &mut Criterion) {
    let schedule = make_schedule_with_points(100);

    c.bench_function("debt_checkpoint", |b| {
        b.iter_batched(
            || DebtCheckpoint::new(Timestamp::new(0)),
            |mut checkpoint| {
                for i in 1u64..=10 {
                    let _ = black_box(checkpoint.checkpoint(Some(&schedule), Timestamp::new(i * 10_000)));
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_usd_conversion(c: &mut Criterion) {
    c.bench_function("usd_fee_to_rate", |b| {
        b.iter(|| {
            black_box(usd_fee_to_rate(
                "CMK",
                black_box(100_000_000_000_000_000_000),
                black_box(2_514),
                black_box(2_592_000),
            ))
        });
    });
}

criterion_group!(
    benches,
    bench_schedule_accrual,
    bench_debt_view,
    bench_checkpoint,
    bench_usd_conversion,
);
criterion_main!(benches);
