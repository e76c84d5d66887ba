//! Indicator collaborator: pure functions from candle history to feature series.
//!
//! Every indicator maps a candle slice to a series of the same length. The first
//! `lookback()` values are `f64::NAN` (warm-up). The value at index t depends only
//! on candles `0..=t`, so live and backtest computation agree candle for candle.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod features;
pub mod macd;
pub mod rsi;
pub mod volume;

pub use atr::Atr;
pub use bollinger::{BollingerBands, BollingerSeries};
pub use ema::Ema;
pub use features::{compute_indicators, IndicatorRow, IndicatorSettings};
pub use macd::{Macd, MacdSeries};
pub use rsi::Rsi;
pub use volume::VolumeMean;

use crate::domain::Candle;

/// Single-series indicator.
///
/// # Look-ahead contamination guard
/// No value at candle t may depend on candle t+1 or later. Every indicator must
/// pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_8", "atr_14").
    fn name(&self) -> &str;

    /// Number of candles before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the whole series.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Close prices of a candle slice.
pub(crate) fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Build synthetic 5-minute candles from close prices for testing.
///
/// open = previous close, high/low = max/min(open, close) ± 1.0, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let open_time = base + chrono::Duration::minutes(5 * i as i64);
            Candle {
                instrument_id: "TEST".to_string(),
                open_time,
                close_time: open_time + chrono::Duration::minutes(5),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
