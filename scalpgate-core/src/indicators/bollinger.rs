//! Bollinger Bands: SMA(close) ± k · population stddev(close).
//!
//! All three bands come out of one rolling pass. Lookback: period - 1.

use super::closes;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    multiplier: f64,
}

/// Lower, middle and upper band series, each the length of the input.
#[derive(Debug, Clone, Default)]
pub struct BollingerSeries {
    pub lower: Vec<f64>,
    pub mid: Vec<f64>,
    pub upper: Vec<f64>,
}

impl BollingerBands {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self { period, multiplier }
    }

    pub fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    pub fn compute(&self, candles: &[Candle]) -> BollingerSeries {
        let closes = closes(candles);
        let n = closes.len();
        let mut out = BollingerSeries {
            lower: vec![f64::NAN; n],
            mid: vec![f64::NAN; n],
            upper: vec![f64::NAN; n],
        };

        for end in self.lookback()..n {
            let window = &closes[end + 1 - self.period..=end];
            if window.iter().any(|v| v.is_nan()) {
                continue;
            }
            let mean = window.iter().sum::<f64>() / self.period as f64;
            let variance =
                window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / self.period as f64;
            let half_width = self.multiplier * variance.sqrt();

            out.mid[end] = mean;
            out.upper[end] = mean + half_width;
            out.lower[end] = mean - half_width;
        }

        out
    }
}
