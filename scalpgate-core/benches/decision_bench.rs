//! Criterion benchmarks for the per-candle decision path.
//!
//! 1. Entry evaluator + gate on a single context
//! 2. Feature precompute over a day of 5-minute candles
//! 3. Full pipeline replay over precomputed contexts

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use scalpgate_core::components::{
    EntryConfirmationGate, EntrySignalEvaluator, PrecomputedPredictions, ThresholdConfig,
};
use scalpgate_core::domain::{Candle, ModelOutput, ModelVerdict};
use scalpgate_core::engine::{build_contexts, InstrumentPipeline, NoFeed, StrategyConfig};
use scalpgate_core::indicators::{compute_indicators, IndicatorSettings};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(n: usize) -> Vec<Candle> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 4.0;
            let open_time = base + Duration::minutes(5 * i as i64);
            Candle {
                instrument_id: "BENCH/USDT".into(),
                open_time,
                close_time: open_time + Duration::minutes(5),
                open: close - 0.2,
                high: close + 0.6,
                low: close - 0.6,
                close,
                volume: 1_000.0 + (i % 400) as f64,
            }
        })
        .collect()
}

fn make_predictions(candles: &[Candle]) -> PrecomputedPredictions {
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let verdict = if i % 3 == 0 {
                ModelVerdict::Unfavorable
            } else {
                ModelVerdict::Favorable
            };
            (c.close_time, ModelOutput::new(verdict, 0.72))
        })
        .collect()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_entry_path(c: &mut Criterion) {
    let candles = make_candles(300);
    let preds = make_predictions(&candles);
    let contexts = build_contexts(&candles, &IndicatorSettings::default(), &preds);
    let ctx = &contexts[250];
    let cfg = ThresholdConfig::default();

    c.bench_function("entry_evaluate_and_confirm", |b| {
        b.iter(|| {
            EntrySignalEvaluator.evaluate(black_box(ctx), &cfg)
                && EntryConfirmationGate.confirm(black_box(ctx), &cfg)
        })
    });
}

fn bench_precompute(c: &mut Criterion) {
    let settings = IndicatorSettings::default();
    let mut group = c.benchmark_group("compute_indicators");
    for n in [288, 2_016, 8_640] {
        let candles = make_candles(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &candles, |b, candles| {
            b.iter(|| compute_indicators(black_box(candles), &settings))
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let config = StrategyConfig::default();
    let candles = make_candles(8_640);
    let preds = make_predictions(&candles);
    let contexts = build_contexts(&candles, &config.indicators, &preds);
    let shared = Arc::new(config);

    c.bench_function("pipeline_replay_30d", |b| {
        b.iter(|| {
            let mut pipeline = InstrumentPipeline::new("BENCH/USDT", Arc::clone(&shared));
            let mut entries = 0usize;
            for (candle, ctx) in candles.iter().zip(&contexts) {
                if let Ok(step) = pipeline.on_candle(candle, ctx.clone(), &NoFeed, 100.0) {
                    entries += usize::from(step.decision.is_entry());
                }
            }
            entries
        })
    });
}

criterion_group!(benches, bench_entry_path, bench_precompute, bench_pipeline);
criterion_main!(benches);
