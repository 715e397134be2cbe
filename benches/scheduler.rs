use criterion::{black_box, criterion_group, criterion_main, Criterion};

use timelapse_forge::{PacingMode, TemporalScheduler, TimestampedSequence};

/// A week of shots every 10 to 70 seconds
fn week_of_shots() -> TimestampedSequence {
    let mut t = 1_700_000_000i64;
    let pairs = (0..10_000).map(|i| {
        t += 10 + (i * 37 % 61);
        (format!("IMG_{:05}.jpg", i), t)
    });
    TimestampedSequence::from_pairs(pairs.collect::<Vec<_>>()).unwrap()
}

fn bench_scheduler(c: &mut Criterion) {
    let sequence = week_of_shots();

    for mode in [PacingMode::FixedRate, PacingMode::Proportional] {
        let scheduler = TemporalScheduler::new(120.0, mode);

        c.bench_function(&format!("frame_counts/{}", mode), |b| {
            b.iter(|| scheduler.frame_counts(black_box(&sequence), 30).unwrap())
        });

        c.bench_function(&format!("durations/{}", mode), |b| {
            b.iter(|| scheduler.durations(black_box(&sequence)).unwrap())
        });
    }
}

criterion_group!(benches, bench_scheduler);
criterion_main!(benches);
