//! Rolling mean of volume. Lookback: period - 1.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct VolumeMean {
    period: usize,
    name: String,
}

impl VolumeMean {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume mean period must be >= 1");
        Self {
            period,
            name: format!("volume_mean_{period}"),
        }
    }
}

impl Indicator for VolumeMean {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let mut result = vec![f64::NAN; candles.len()];
        for (i, window) in candles.windows(self.period).enumerate() {
            // a NaN anywhere in the window makes the mean NaN on its own
            let sum: f64 = window.iter().map(|c| c.volume).sum();
            result[i + self.period - 1] = sum / self.period as f64;
        }
        result
    }
}
