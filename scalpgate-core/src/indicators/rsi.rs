//! Relative Strength Index (RSI), Wilder smoothing.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss). Lookback: period.
//! Flat window → 50; no losses → 100; no gains → 0.

use super::{closes, Indicator};
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes = closes(candles);
        let n = closes.len();
        let mut result = vec![f64::NAN; n];
        if n <= self.period {
            return result;
        }

        let change = |i: usize| closes[i] - closes[i - 1];

        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for i in 1..=self.period {
            let ch = change(i);
            if ch.is_nan() {
                return result;
            }
            avg_gain += ch.max(0.0);
            avg_loss += (-ch).max(0.0);
        }
        avg_gain /= self.period as f64;
        avg_loss /= self.period as f64;
        result[self.period] = rsi_value(avg_gain, avg_loss);

        let alpha = 1.0 / self.period as f64;
        for i in (self.period + 1)..n {
            let ch = change(i);
            if ch.is_nan() {
                break;
            }
            avg_gain = alpha * ch.max(0.0) + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * (-ch).max(0.0) + (1.0 - alpha) * avg_loss;
            result[i] = rsi_value(avg_gain, avg_loss);
        }

        result
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    match (avg_gain == 0.0, avg_loss == 0.0) {
        (true, true) => 50.0,
        (_, true) => 100.0,
        (true, _) => 0.0,
        _ => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles};

    #[test]
    fn rsi_all_gains() {
        let result = Rsi::new(3).compute(&make_candles(&[100.0, 101.0, 102.0, 103.0, 104.0]));
        assert_approx(result[3], 100.0, 1e-9);
        assert_approx(result[4], 100.0, 1e-9);
    }

    #[test]
    fn rsi_all_losses() {
        let result = Rsi::new(3).compute(&make_candles(&[105.0, 104.0, 103.0, 102.0, 101.0]));
        assert_approx(result[3], 0.0, 1e-9);
    }

    #[test]
    fn rsi_flat_is_fifty() {
        let result = Rsi::new(3).compute(&make_candles(&[100.0; 6]));
        assert_approx(result[5], 50.0, 1e-9);
    }

    #[test]
    fn rsi_known_seed_value() {
        // changes: +0.34, -0.25, -0.48 → avg_gain = 0.34/3, avg_loss = 0.73/3
        let result = Rsi::new(3).compute(&make_candles(&[44.0, 44.34, 44.09, 43.61]));
        let expected = 100.0 - 100.0 / (1.0 + 0.34 / 0.73);
        assert!(result[2].is_nan());
        assert_approx(result[3], expected, 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let candles = make_candles(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        for (i, &v) in Rsi::new(3).compute(&candles).iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "RSI out of bounds at {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_nan_in_seed_is_all_nan() {
        let mut candles = make_candles(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        candles[2].close = f64::NAN;
        assert!(Rsi::new(3).compute(&candles).iter().all(|v| v.is_nan()));
    }
}
