//! Average True Range (ATR).
//!
//! TR[t] = max(high - low, |high - close[t-1]|, |low - close[t-1]|).
//! ATR is the Wilder-smoothed TR (alpha = 1/period), seeded with the mean of
//! TR[1..=period]. Lookback: period.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True range series. TR[0] is NaN: the first candle has no previous close.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let mut tr = vec![f64::NAN; candles.len()];
    for (i, pair) in candles.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        let pc = prev.close;
        tr[i + 1] = (cur.high - cur.low)
            .max((cur.high - pc).abs())
            .max((cur.low - pc).abs());
        if cur.high.is_nan() || cur.low.is_nan() || pc.is_nan() {
            tr[i + 1] = f64::NAN;
        }
    }
    tr
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let tr = true_range(candles);
        let n = tr.len();
        let mut result = vec![f64::NAN; n];
        if n <= self.period {
            return result;
        }

        let seed_window = &tr[1..=self.period];
        if seed_window.iter().any(|v| v.is_nan()) {
            return result;
        }
        let mut prev = seed_window.iter().sum::<f64>() / self.period as f64;
        result[self.period] = prev;

        let alpha = 1.0 / self.period as f64;
        for i in (self.period + 1)..n {
            if tr[i].is_nan() {
                break;
            }
            prev = alpha * tr[i] + (1.0 - alpha) * prev;
            result[i] = prev;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    fn ohlc(data: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        let mut candles = make_candles(&vec![1.0; data.len()]);
        for (c, &(open, high, low, close)) in candles.iter_mut().zip(data) {
            c.open = open;
            c.high = high;
            c.low = low;
            c.close = close;
        }
        candles
    }

    #[test]
    fn true_range_uses_previous_close() {
        let candles = ohlc(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // gap up: |115 - 100| = 15
            (112.0, 113.0, 104.0, 105.0), // max(9, 1, 8) = 9
        ]);
        let tr = true_range(&candles);
        assert!(tr[0].is_nan());
        assert_approx(tr[1], 15.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_2_known_values() {
        let candles = ohlc(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
        ]);
        let atr = Atr::new(2).compute(&candles);
        assert!(atr[1].is_nan());
        assert_approx(atr[2], 8.5, DEFAULT_EPSILON);
        // 0.5 * 6 + 0.5 * 8.5
        assert_approx(atr[3], 7.25, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_constant_range() {
        // make_candles with flat closes: every range is 2.0
        let atr = Atr::new(3).compute(&make_candles(&[100.0; 8]));
        assert_approx(atr[7], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_lookback() {
        assert_eq!(Atr::new(14).lookback(), 14);
    }
}
