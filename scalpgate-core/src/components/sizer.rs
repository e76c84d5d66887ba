//! Position sizer: dampens the proposed stake as realized volatility rises.
//!
//! Sizing is decoupled from signal generation: it never changes whether an
//! entry happens, only how large it is.

use super::thresholds::ThresholdConfig;

#[derive(Debug, Clone, Copy, Default)]
pub struct PositionSizer;

impl PositionSizer {
    /// Scale `proposed_stake` by the multiplier of the highest volatility tier
    /// whose floor `atr / current_price * 100` exceeds.
    ///
    /// Fails open: a zero, negative or NaN ATR (or an unusable price) returns
    /// the proposal unchanged, as does an ATR% below every tier.
    pub fn size(
        &self,
        proposed_stake: f64,
        atr: f64,
        current_price: f64,
        cfg: &ThresholdConfig,
    ) -> f64 {
        if atr.is_nan() || atr <= 0.0 {
            return proposed_stake;
        }
        if current_price.is_nan() || current_price <= 0.0 {
            return proposed_stake;
        }

        let atr_pct = atr / current_price * 100.0;
        match Self::tier_multiplier(atr_pct, cfg) {
            Some(multiplier) => proposed_stake * multiplier,
            None => proposed_stake,
        }
    }

    /// Multiplier of the first tier, scanning floors in descending order, that
    /// `atr_pct` strictly exceeds.
    pub fn tier_multiplier(atr_pct: f64, cfg: &ThresholdConfig) -> Option<f64> {
        cfg.volatility_tiers
            .iter()
            .filter(|tier| atr_pct > tier.atr_pct_floor)
            .max_by(|a, b| a.atr_pct_floor.total_cmp(&b.atr_pct_floor))
            .map(|tier| tier.stake_multiplier)
    }
}
