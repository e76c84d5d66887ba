//! Context precomputation for a whole candle series.
//!
//! Indicators are causal, so computing them once over the full history yields
//! the same contexts a live feed would produce candle by candle.

use crate::components::Predictor;
use crate::domain::{Candle, CandleContext};
use crate::indicators::{compute_indicators, IndicatorSettings};

/// One context per candle, in input order.
pub fn build_contexts(
    candles: &[Candle],
    settings: &IndicatorSettings,
    predictor: &dyn Predictor,
) -> Vec<CandleContext> {
    let rows = compute_indicators(candles, settings);
    debug_assert_eq!(rows.len(), candles.len());
    candles
        .iter()
        .zip(&rows)
        .map(|(candle, row)| CandleContext::from_parts(candle, row, predictor.predict(candle, row)))
        .collect()
}
