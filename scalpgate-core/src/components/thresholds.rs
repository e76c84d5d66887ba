//! ThresholdConfig: the tunable parameters every evaluator and gate reads.
//!
//! Loaded once per process and read-only during evaluation. Range checks run
//! at load time through [`ThresholdConfig::validated`]; evaluators assume a
//! validated config and never re-check.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One step of the volatility sizing schedule: when ATR% exceeds
/// `atr_pct_floor`, the proposed stake is multiplied by `stake_multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityTier {
    pub atr_pct_floor: f64,
    pub stake_multiplier: f64,
}

impl VolatilityTier {
    pub const fn new(atr_pct_floor: f64, stake_multiplier: f64) -> Self {
        Self {
            atr_pct_floor,
            stake_multiplier,
        }
    }
}

/// Errors raised when a threshold is outside its valid range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("min_hold_minutes must be a finite, non-negative number (got {0})")]
    InvalidMinHold(f64),
    #[error("volatility tier {index}: {reason}")]
    InvalidTier { index: usize, reason: String },
    #[error("volatility tiers must dampen monotonically: multiplier {higher} at floor {higher_floor} exceeds {lower} at floor {lower_floor}")]
    NonMonotoneTiers {
        higher_floor: f64,
        higher: f64,
        lower_floor: f64,
        lower: f64,
    },
}

pub const RSI_BUY_CEILING_RANGE: (f64, f64) = (20.0, 40.0);
pub const RSI_SELL_FLOOR_RANGE: (f64, f64) = (60.0, 80.0);
pub const MODEL_CONFIDENCE_FLOOR_RANGE: (f64, f64) = (0.5, 0.8);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub rsi_buy_ceiling: f64,
    pub rsi_sell_floor: f64,
    pub rsi_buy_enabled: bool,
    pub rsi_sell_enabled: bool,
    pub model_confidence_floor: f64,
    pub min_hold_minutes: f64,
    /// Sorted by descending `atr_pct_floor` once validated.
    pub volatility_tiers: Vec<VolatilityTier>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            rsi_buy_ceiling: 30.0,
            rsi_sell_floor: 70.0,
            rsi_buy_enabled: true,
            rsi_sell_enabled: true,
            model_confidence_floor: 0.65,
            min_hold_minutes: 5.0,
            volatility_tiers: vec![VolatilityTier::new(2.0, 0.7), VolatilityTier::new(1.5, 0.85)],
        }
    }
}

impl ThresholdConfig {
    /// Check every range and normalize tier order.
    pub fn validated(mut self) -> Result<Self, ThresholdError> {
        check_range("rsi_buy_ceiling", self.rsi_buy_ceiling, RSI_BUY_CEILING_RANGE)?;
        check_range("rsi_sell_floor", self.rsi_sell_floor, RSI_SELL_FLOOR_RANGE)?;
        check_range(
            "model_confidence_floor",
            self.model_confidence_floor,
            MODEL_CONFIDENCE_FLOOR_RANGE,
        )?;
        if !(self.min_hold_minutes.is_finite() && self.min_hold_minutes >= 0.0) {
            return Err(ThresholdError::InvalidMinHold(self.min_hold_minutes));
        }

        for (index, tier) in self.volatility_tiers.iter().enumerate() {
            if !(tier.atr_pct_floor.is_finite() && tier.atr_pct_floor > 0.0) {
                return Err(ThresholdError::InvalidTier {
                    index,
                    reason: format!("atr_pct_floor must be positive, got {}", tier.atr_pct_floor),
                });
            }
            if !(tier.stake_multiplier > 0.0 && tier.stake_multiplier <= 1.0) {
                return Err(ThresholdError::InvalidTier {
                    index,
                    reason: format!(
                        "stake_multiplier must be in (0, 1], got {}",
                        tier.stake_multiplier
                    ),
                });
            }
        }

        self.volatility_tiers
            .sort_by(|a, b| b.atr_pct_floor.total_cmp(&a.atr_pct_floor));
        for pair in self.volatility_tiers.windows(2) {
            let (higher, lower) = (pair[0], pair[1]);
            if higher.atr_pct_floor == lower.atr_pct_floor {
                return Err(ThresholdError::InvalidTier {
                    index: 0,
                    reason: format!("duplicate atr_pct_floor {}", higher.atr_pct_floor),
                });
            }
            if higher.stake_multiplier > lower.stake_multiplier {
                return Err(ThresholdError::NonMonotoneTiers {
                    higher_floor: higher.atr_pct_floor,
                    higher: higher.stake_multiplier,
                    lower_floor: lower.atr_pct_floor,
                    lower: lower.stake_multiplier,
                });
            }
        }

        Ok(self)
    }
}

fn check_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), ThresholdError> {
    // NaN fails both comparisons and lands here too
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ThresholdError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = ThresholdConfig::default().validated().unwrap();
        assert_eq!(cfg.rsi_buy_ceiling, 30.0);
        assert_eq!(cfg.rsi_sell_floor, 70.0);
        assert_eq!(cfg.model_confidence_floor, 0.65);
        assert_eq!(cfg.min_hold_minutes, 5.0);
        assert_eq!(cfg.volatility_tiers[0], VolatilityTier::new(2.0, 0.7));
    }

    #[test]
    fn range_edges_are_inclusive() {
        let cfg = ThresholdConfig {
            rsi_buy_ceiling: 40.0,
            rsi_sell_floor: 60.0,
            model_confidence_floor: 0.5,
            ..Default::default()
        };
        assert!(cfg.validated().is_ok());
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let cfg = ThresholdConfig {
            rsi_buy_ceiling: 45.0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validated(),
            Err(ThresholdError::OutOfRange {
                field: "rsi_buy_ceiling",
                ..
            })
        ));

        let cfg = ThresholdConfig {
            model_confidence_floor: f64::NAN,
            ..Default::default()
        };
        assert!(cfg.validated().is_err());

        let cfg = ThresholdConfig {
            min_hold_minutes: -1.0,
            ..Default::default()
        };
        assert_eq!(cfg.validated(), Err(ThresholdError::InvalidMinHold(-1.0)));
    }

    #[test]
    fn tiers_sorted_descending() {
        let cfg = ThresholdConfig {
            volatility_tiers: vec![
                VolatilityTier::new(1.5, 0.85),
                VolatilityTier::new(3.0, 0.5),
                VolatilityTier::new(2.0, 0.7),
            ],
            ..Default::default()
        }
        .validated()
        .unwrap();
        let floors: Vec<f64> = cfg.volatility_tiers.iter().map(|t| t.atr_pct_floor).collect();
        assert_eq!(floors, vec![3.0, 2.0, 1.5]);
    }

    #[test]
    fn rejects_non_monotone_tiers() {
        let cfg = ThresholdConfig {
            volatility_tiers: vec![VolatilityTier::new(2.0, 0.9), VolatilityTier::new(1.5, 0.8)],
            ..Default::default()
        };
        assert!(matches!(
            cfg.validated(),
            Err(ThresholdError::NonMonotoneTiers { .. })
        ));
    }

    #[test]
    fn rejects_bad_tier_values() {
        for tier in [
            VolatilityTier::new(0.0, 0.5),
            VolatilityTier::new(2.0, 0.0),
            VolatilityTier::new(2.0, 1.5),
            VolatilityTier::new(f64::INFINITY, 0.5),
        ] {
            let cfg = ThresholdConfig {
                volatility_tiers: vec![tier],
                ..Default::default()
            };
            assert!(matches!(
                cfg.validated(),
                Err(ThresholdError::InvalidTier { index: 0, .. })
            ));
        }
    }

    #[test]
    fn empty_tier_table_is_allowed() {
        let cfg = ThresholdConfig {
            volatility_tiers: Vec::new(),
            ..Default::default()
        };
        assert!(cfg.validated().is_ok());
    }

    #[test]
    fn partial_toml_like_json_uses_defaults() {
        let cfg: ThresholdConfig = serde_json::from_str(r#"{"rsi_buy_ceiling": 25}"#).unwrap();
        assert_eq!(cfg.rsi_buy_ceiling, 25.0);
        assert_eq!(cfg.rsi_sell_floor, 70.0);
        assert!(cfg.rsi_buy_enabled);
    }
}
