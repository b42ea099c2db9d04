//! Criterion benchmarks for signalbox hot paths.
//!
//! Benchmarks:
//! 1. Rolling mean / std over growing series
//! 2. Full indicator frame computation
//! 3. Signal generation for both strategies
//! 4. Decision environment episode with a fixed policy

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use signalbox_core::data::synthetic_series;
use signalbox_core::indicators::{rolling_mean, rolling_std};
use signalbox_core::{
    Action, DecisionEnvironment, EnvConfig, FrameConfig, IndicatorFrame, MeanReversion,
    SignalGenerator, TrendFollower,
};

const SIZES: [usize; 3] = [500, 2_000, 10_000];

fn bench_rolling(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling");
    for n in SIZES {
        let prices = synthetic_series("BENCH", n, 1).prices();
        group.bench_with_input(BenchmarkId::new("mean_100", n), &prices, |b, p| {
            b.iter(|| rolling_mean(black_box(p), 100))
        });
        group.bench_with_input(BenchmarkId::new("std_20", n), &prices, |b, p| {
            b.iter(|| rolling_std(black_box(p), 20))
        });
    }
    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_frame");
    for n in SIZES {
        let series = synthetic_series("BENCH", n, 1);
        group.bench_with_input(BenchmarkId::from_parameter(n), &series, |b, s| {
            b.iter(|| IndicatorFrame::compute(black_box(s), FrameConfig::default()))
        });
    }
    group.finish();
}

fn bench_signals(c: &mut Criterion) {
    let series = synthetic_series("BENCH", 2_000, 1);
    let trend = TrendFollower::default_params();
    let reversion = MeanReversion::default_params();

    c.bench_function("signals/trend_following_2000", |b| {
        b.iter(|| trend.run(black_box(&series)))
    });
    c.bench_function("signals/mean_reversion_2000", |b| {
        b.iter(|| reversion.run(black_box(&series)))
    });
}

fn bench_episode(c: &mut Criterion) {
    let series = synthetic_series("BENCH", 2_000, 1);
    let env = DecisionEnvironment::from_series(&series, FrameConfig::default(), EnvConfig::default())
        .expect("bench environment");

    c.bench_function("environment/episode_2000", |b| {
        b.iter(|| {
            let mut env = env.clone();
            env.reset();
            let mut i = 0usize;
            while !env.is_done() {
                let action = Action::ALL[i % 3];
                black_box(env.step(action).expect("step before done"));
                i += 1;
            }
        })
    });
}

criterion_group!(benches, bench_rolling, bench_frame, bench_signals, bench_episode);
criterion_main!(benches);
