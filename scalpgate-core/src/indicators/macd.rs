//! MACD: EMA(fast) - EMA(slow), with an EMA(signal) of the line.
//!
//! Lookback: slow - 1 for the line, slow + signal - 2 for the signal line.

use super::closes;
use super::ema::ema_of_series;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(slow > fast, "MACD slow period must exceed fast period");
        Self { fast, slow, signal }
    }

    pub fn lookback(&self) -> usize {
        self.slow + self.signal - 2
    }

    pub fn compute(&self, candles: &[Candle]) -> MacdSeries {
        let closes = closes(candles);
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);
        let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_of_series(&line, self.signal);
        MacdSeries { line, signal }
    }
}
