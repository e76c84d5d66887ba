//! CandleContext: immutable snapshot of the most recently closed candle.
//!
//! One context exists per (instrument, candle) pair. The next candle's context
//! supersedes it; nothing ever mutates a context after construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::candle::Candle;
use crate::indicators::IndicatorRow;

/// Classification verdict reported by the predictive model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ModelVerdict {
    /// Model does not predict a favorable move (class 0).
    Unfavorable,
    /// Model predicts a favorable move (class 1).
    Favorable,
}

impl TryFrom<u8> for ModelVerdict {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unfavorable),
            1 => Ok(Self::Favorable),
            other => Err(format!("model verdict must be 0 or 1, got {other}")),
        }
    }
}

impl From<ModelVerdict> for u8 {
    fn from(verdict: ModelVerdict) -> Self {
        match verdict {
            ModelVerdict::Unfavorable => 0,
            ModelVerdict::Favorable => 1,
        }
    }
}

/// Per-candle output of the predictive model collaborator.
///
/// `confidence` is a data-quality / out-of-distribution estimate in `[0, 1]`,
/// not a calibrated class probability. NaN means the model had no opinion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub verdict: ModelVerdict,
    pub confidence: f64,
}

impl ModelOutput {
    pub fn new(verdict: ModelVerdict, confidence: f64) -> Self {
        Self {
            verdict,
            confidence,
        }
    }

    /// Output used when no prediction exists for a candle. Blocks entries, and
    /// the NaN confidence keeps the verdict from counting as a model exit.
    pub fn missing() -> Self {
        Self {
            verdict: ModelVerdict::Unfavorable,
            confidence: f64::NAN,
        }
    }
}

/// Everything the decision engine knows about one closed candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleContext {
    pub instrument_id: String,
    pub candle_close_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub rolling_volume_mean: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub bollinger_lower: f64,
    pub bollinger_mid: f64,
    pub bollinger_upper: f64,
    pub atr: f64,
    pub model_class_verdict: ModelVerdict,
    pub model_confidence: f64,
}

impl CandleContext {
    /// Assemble a context from the raw candle, its indicator row and the model output.
    pub fn from_parts(candle: &Candle, row: &IndicatorRow, model: ModelOutput) -> Self {
        Self {
            instrument_id: candle.instrument_id.clone(),
            candle_close_time: candle.close_time,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
            rolling_volume_mean: row.volume_mean,
            rsi: row.rsi,
            macd: row.macd,
            macd_signal: row.macd_signal,
            ema_fast: row.ema_fast,
            ema_slow: row.ema_slow,
            bollinger_lower: row.bollinger_lower,
            bollinger_mid: row.bollinger_mid,
            bollinger_upper: row.bollinger_upper,
            atr: row.atr,
            model_class_verdict: model.verdict,
            model_confidence: model.confidence,
        }
    }

    /// Relative Bollinger band width: (upper - lower) / mid.
    pub fn bollinger_width(&self) -> f64 {
        (self.bollinger_upper - self.bollinger_lower) / self.bollinger_mid
    }

    /// ATR as a percentage of the close price.
    pub fn atr_pct(&self) -> f64 {
        self.atr / self.close * 100.0
    }

    /// False when the model produced nothing for this candle.
    pub fn has_model_output(&self) -> bool {
        !self.model_confidence.is_nan()
    }

    /// True while any derived value is still in warm-up (NaN).
    pub fn has_missing_data(&self) -> bool {
        [
            self.rolling_volume_mean,
            self.rsi,
            self.macd,
            self.macd_signal,
            self.ema_fast,
            self.ema_slow,
            self.bollinger_lower,
            self.bollinger_mid,
            self.bollinger_upper,
            self.atr,
            self.model_confidence,
        ]
        .iter()
        .any(|v| v.is_nan())
    }
}
