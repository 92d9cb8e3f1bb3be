//! Criterion benchmarks for the statistics hot paths.
//!
//! Benchmarks:
//! 1. SMA over one to ten years of daily closes
//! 2. Global vs rolling classification plus stepping
//! 3. Spread + z-scores + hedge ratio for an aligned pair
//! 4. Engle-Granger cointegration test

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pairlab_core::signals::{classify, classify_rolling, step};
use pairlab_core::stats::{cointegration, hedge_ratio, sma, spread, zscores};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_closes(n: usize, phase: f64) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + (i as f64 * 0.1 + phase).sin() * 10.0 + i as f64 * 0.01)
        .collect()
}

const SIZES: [usize; 3] = [252, 1260, 2520];

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_sma(c: &mut Criterion) {
    let mut group = c.benchmark_group("sma");
    for &n in &SIZES {
        let closes = make_closes(n, 0.0);
        for window in [20, 50] {
            group.bench_with_input(
                BenchmarkId::new(format!("sma_{window}"), n),
                &n,
                |b, _| b.iter(|| sma(black_box(&closes), window)),
            );
        }
    }
    group.finish();
}

fn bench_signals(c: &mut Criterion) {
    let mut group = c.benchmark_group("signals");
    for &n in &SIZES {
        let closes = make_closes(n, 0.0);
        group.bench_with_input(BenchmarkId::new("classify_step", n), &n, |b, _| {
            b.iter(|| classify(black_box(&closes)).map(|s| step(&s)))
        });
        group.bench_with_input(BenchmarkId::new("classify_rolling_20", n), &n, |b, _| {
            b.iter(|| classify_rolling(black_box(&closes), 20))
        });
    }
    group.finish();
}

fn bench_pair_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_stats");
    for &n in &SIZES {
        let left = make_closes(n, 0.0);
        let right = make_closes(n, 0.5);
        group.bench_with_input(BenchmarkId::new("spread_zscore_hedge", n), &n, |b, _| {
            b.iter(|| {
                let s = spread(black_box(&left), black_box(&right)).ok()?;
                let z = zscores(&s).ok()?;
                let h = hedge_ratio(&left, &right).ok()?;
                Some((z.mean, h.beta))
            })
        });
        group.bench_with_input(BenchmarkId::new("cointegration", n), &n, |b, _| {
            b.iter(|| cointegration(black_box(&left), black_box(&right)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sma, bench_signals, bench_pair_stats);
criterion_main!(benches);
