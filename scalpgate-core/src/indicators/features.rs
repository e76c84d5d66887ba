//! Per-candle feature rows consumed by `CandleContext`.

use serde::{Deserialize, Serialize};

use super::{Atr, BollingerBands, Ema, Indicator, Macd, Rsi, VolumeMean};
use crate::domain::Candle;

/// Indicator periods. Defaults: rsi 14, macd 12/26/9, ema 8 and 21,
/// bollinger 20 / 2σ, atr 14, volume mean 20.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub bollinger_period: usize,
    pub bollinger_stddev: f64,
    pub atr_period: usize,
    pub volume_mean_period: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            ema_fast: 8,
            ema_slow: 21,
            bollinger_period: 20,
            bollinger_stddev: 2.0,
            atr_period: 14,
            volume_mean_period: 20,
        }
    }
}

impl IndicatorSettings {
    /// Candles needed before every feature is populated.
    pub fn warmup_candles(&self) -> usize {
        [
            self.rsi_period,
            self.macd_slow + self.macd_signal - 2,
            self.ema_fast.saturating_sub(1),
            self.ema_slow.saturating_sub(1),
            self.bollinger_period.saturating_sub(1),
            self.atr_period,
            self.volume_mean_period.saturating_sub(1),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Periods must be usable by the indicator constructors.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let periods = [
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_signal", self.macd_signal),
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("bollinger_period", self.bollinger_period),
            ("atr_period", self.atr_period),
            ("volume_mean_period", self.volume_mean_period),
        ];
        for (name, value) in periods {
            if value == 0 {
                problems.push(format!("{name} must be >= 1"));
            }
        }
        if self.macd_slow <= self.macd_fast {
            problems.push("macd_slow must exceed macd_fast".into());
        }
        if !(self.bollinger_stddev.is_finite() && self.bollinger_stddev > 0.0) {
            problems.push("bollinger_stddev must be a positive number".into());
        }
        problems
    }
}

/// Derived technical values for one candle. NaN during warm-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub bollinger_lower: f64,
    pub bollinger_mid: f64,
    pub bollinger_upper: f64,
    pub atr: f64,
    pub volume_mean: f64,
}

/// Compute one feature row per candle.
///
/// Deterministic and free of look-ahead: row t equals row t of any longer
/// series that shares candles `0..=t`.
///
/// # Panics
/// If `settings` has not passed `problems()`.
pub fn compute_indicators(candles: &[Candle], settings: &IndicatorSettings) -> Vec<IndicatorRow> {
    let rsi = Rsi::new(settings.rsi_period).compute(candles);
    let macd = Macd::new(settings.macd_fast, settings.macd_slow, settings.macd_signal)
        .compute(candles);
    let ema_fast = Ema::new(settings.ema_fast).compute(candles);
    let ema_slow = Ema::new(settings.ema_slow).compute(candles);
    let bands =
        BollingerBands::new(settings.bollinger_period, settings.bollinger_stddev).compute(candles);
    let atr = Atr::new(settings.atr_period).compute(candles);
    let volume_mean = VolumeMean::new(settings.volume_mean_period).compute(candles);

    (0..candles.len())
        .map(|i| IndicatorRow {
            rsi: rsi[i],
            macd: macd.line[i],
            macd_signal: macd.signal[i],
            ema_fast: ema_fast[i],
            ema_slow: ema_slow[i],
            bollinger_lower: bands.lower[i],
            bollinger_mid: bands.mid[i],
            bollinger_upper: bands.upper[i],
            atr: atr[i],
            volume_mean: volume_mean[i],
        })
        .collect()
}
