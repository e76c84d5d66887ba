//! Entry signal evaluator: hard AND over the model verdict and technical filters.
//!
//! Every enabled check must hold for an entry. There is no weighting or
//! partial credit. Comparisons against NaN are false, so missing data never
//! produces an entry.

use serde::{Deserialize, Serialize};

use super::thresholds::ThresholdConfig;
use crate::domain::{CandleContext, ModelVerdict};

/// Candle volume must exceed this fraction of its rolling mean.
pub const ENTRY_VOLUME_FRACTION: f64 = 0.7;
/// Minimum relative Bollinger width (upper - lower) / mid.
pub const MIN_BOLLINGER_WIDTH: f64 = 0.01;
/// Close must sit below this fraction of the upper band.
pub const UPPER_BAND_FRACTION: f64 = 0.98;
/// Tag recorded on positions opened by this evaluator.
pub const ENTRY_TAG: &str = "ml_entry";

/// Outcome of each named entry check. `rsi_below_ceiling` is `None` when the
/// RSI filter is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryChecks {
    pub model_favorable: bool,
    pub confidence_above_floor: bool,
    pub liquid_volume: bool,
    pub rsi_below_ceiling: Option<bool>,
    pub above_ema_fast: bool,
    pub bands_wide_enough: bool,
    pub below_upper_band: bool,
}

impl EntryChecks {
    pub fn all_pass(&self) -> bool {
        self.model_favorable
            && self.confidence_above_floor
            && self.liquid_volume
            && self.rsi_below_ceiling.unwrap_or(true)
            && self.above_ema_fast
            && self.bands_wide_enough
            && self.below_upper_band
    }

    /// Names of the checks that failed, in evaluation order.
    pub fn failures(&self) -> Vec<&'static str> {
        [
            ("model_favorable", self.model_favorable),
            ("confidence_above_floor", self.confidence_above_floor),
            ("liquid_volume", self.liquid_volume),
            ("rsi_below_ceiling", self.rsi_below_ceiling.unwrap_or(true)),
            ("above_ema_fast", self.above_ema_fast),
            ("bands_wide_enough", self.bands_wide_enough),
            ("below_upper_band", self.below_upper_band),
        ]
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EntrySignalEvaluator;

impl EntrySignalEvaluator {
    /// True only if every enabled entry condition holds.
    pub fn evaluate(&self, ctx: &CandleContext, cfg: &ThresholdConfig) -> bool {
        ctx.model_class_verdict == ModelVerdict::Favorable
            && ctx.model_confidence > cfg.model_confidence_floor
            && ctx.volume > ctx.rolling_volume_mean * ENTRY_VOLUME_FRACTION
            && (!cfg.rsi_buy_enabled || ctx.rsi < cfg.rsi_buy_ceiling)
            && ctx.close > ctx.ema_fast
            && ctx.bollinger_width() > MIN_BOLLINGER_WIDTH
            && ctx.close < ctx.bollinger_upper * UPPER_BAND_FRACTION
    }

    /// Evaluate every check without short-circuiting, for diagnostics.
    pub fn checks(&self, ctx: &CandleContext, cfg: &ThresholdConfig) -> EntryChecks {
        EntryChecks {
            model_favorable: ctx.model_class_verdict == ModelVerdict::Favorable,
            confidence_above_floor: ctx.model_confidence > cfg.model_confidence_floor,
            liquid_volume: ctx.volume > ctx.rolling_volume_mean * ENTRY_VOLUME_FRACTION,
            rsi_below_ceiling: cfg.rsi_buy_enabled.then(|| ctx.rsi < cfg.rsi_buy_ceiling),
            above_ema_fast: ctx.close > ctx.ema_fast,
            bands_wide_enough: ctx.bollinger_width() > MIN_BOLLINGER_WIDTH,
            below_upper_band: ctx.close < ctx.bollinger_upper * UPPER_BAND_FRACTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::test_support::entry_ready_context;

    #[test]
    fn all_conditions_hold() {
        let cfg = ThresholdConfig::default();
        let ctx = entry_ready_context();
        assert!(EntrySignalEvaluator.evaluate(&ctx, &cfg));
        assert!(EntrySignalEvaluator.checks(&ctx, &cfg).all_pass());
    }

    #[test]
    fn unfavorable_verdict_blocks_entry() {
        let cfg = ThresholdConfig::default();
        let mut ctx = entry_ready_context();
        ctx.model_class_verdict = ModelVerdict::Unfavorable;
        assert!(!EntrySignalEvaluator.evaluate(&ctx, &cfg));
        assert_eq!(
            EntrySignalEvaluator.checks(&ctx, &cfg).failures(),
            vec!["model_favorable"]
        );
    }

    #[test]
    fn confidence_must_strictly_exceed_floor() {
        let cfg = ThresholdConfig::default();
        let mut ctx = entry_ready_context();
        ctx.model_confidence = cfg.model_confidence_floor;
        assert!(!EntrySignalEvaluator.evaluate(&ctx, &cfg));
    }

    #[test]
    fn illiquid_candle_blocks_entry() {
        let cfg = ThresholdConfig::default();
        let mut ctx = entry_ready_context();
        ctx.volume = ctx.rolling_volume_mean * 0.7;
        assert!(!EntrySignalEvaluator.evaluate(&ctx, &cfg));
    }

    #[test]
    fn rsi_filter_respects_toggle() {
        let mut cfg = ThresholdConfig::default();
        let mut ctx = entry_ready_context();
        ctx.rsi = 55.0;
        assert!(!EntrySignalEvaluator.evaluate(&ctx, &cfg));

        cfg.rsi_buy_enabled = false;
        assert!(EntrySignalEvaluator.evaluate(&ctx, &cfg));
        assert_eq!(EntrySignalEvaluator.checks(&ctx, &cfg).rsi_below_ceiling, None);
    }

    #[test]
    fn narrow_bands_block_entry() {
        let cfg = ThresholdConfig::default();
        let mut ctx = entry_ready_context();
        ctx.bollinger_lower = 99.8;
        ctx.bollinger_upper = 100.2;
        ctx.bollinger_mid = 100.0;
        assert!(!EntrySignalEvaluator.evaluate(&ctx, &cfg));
    }

    #[test]
    fn close_near_upper_band_blocks_entry() {
        let cfg = ThresholdConfig::default();
        let mut ctx = entry_ready_context();
        ctx.close = ctx.bollinger_upper * 0.985;
        assert!(!EntrySignalEvaluator.evaluate(&ctx, &cfg));
        assert_eq!(
            EntrySignalEvaluator.checks(&ctx, &cfg).failures(),
            vec!["below_upper_band"]
        );
    }

    #[test]
    fn nan_fields_fail_closed() {
        let cfg = ThresholdConfig::default();
        for field in 0..5 {
            let mut ctx = entry_ready_context();
            match field {
                0 => ctx.rsi = f64::NAN,
                1 => ctx.ema_fast = f64::NAN,
                2 => ctx.rolling_volume_mean = f64::NAN,
                3 => ctx.bollinger_mid = f64::NAN,
                _ => ctx.model_confidence = f64::NAN,
            }
            assert!(!EntrySignalEvaluator.evaluate(&ctx, &cfg), "field {field}");
        }
    }
}
