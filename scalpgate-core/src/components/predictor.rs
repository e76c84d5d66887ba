//! Boundary to the predictive model. Training lives elsewhere; the engine only
//! consumes one verdict and confidence per closed candle.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{Candle, ModelOutput};
use crate::indicators::IndicatorRow;

pub trait Predictor: Send + Sync {
    fn predict(&self, candle: &Candle, row: &IndicatorRow) -> ModelOutput;
}

/// Model outputs computed offline and shipped alongside the candles, keyed by
/// candle close time. Candles without an entry get `ModelOutput::missing()`.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedPredictions {
    outputs: HashMap<DateTime<Utc>, ModelOutput>,
}

impl PrecomputedPredictions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, close_time: DateTime<Utc>, output: ModelOutput) {
        self.outputs.insert(close_time, output);
    }

    /// Output recorded for the candle closing at `close_time`, if any.
    pub fn get(&self, close_time: DateTime<Utc>) -> Option<ModelOutput> {
        self.outputs.get(&close_time).copied()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl FromIterator<(DateTime<Utc>, ModelOutput)> for PrecomputedPredictions {
    fn from_iter<I: IntoIterator<Item = (DateTime<Utc>, ModelOutput)>>(iter: I) -> Self {
        Self {
            outputs: iter.into_iter().collect(),
        }
    }
}

impl Predictor for PrecomputedPredictions {
    fn predict(&self, candle: &Candle, _row: &IndicatorRow) -> ModelOutput {
        self.get(candle.close_time).unwrap_or_else(ModelOutput::missing)
    }
}
