//! Strategy configuration: everything the pipeline reads, validated once at load.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{ProtectiveConfig, ProtectiveError, ThresholdConfig, ThresholdError};
use crate::indicators::IndicatorSettings;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub thresholds: ThresholdConfig,
    pub protective: ProtectiveConfig,
    pub indicators: IndicatorSettings,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("invalid thresholds: {0}")]
    Thresholds(#[from] ThresholdError),
    #[error("invalid protective exits: {0}")]
    Protective(#[from] ProtectiveError),
    #[error("invalid indicator settings: {}", .0.join("; "))]
    Indicators(Vec<String>),
}

impl StrategyConfig {
    pub fn validated(self) -> Result<Self, StrategyError> {
        let problems = self.indicators.problems();
        if !problems.is_empty() {
            return Err(StrategyError::Indicators(problems));
        }
        Ok(Self {
            thresholds: self.thresholds.validated()?,
            protective: self.protective.validated()?,
            indicators: self.indicators,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_is_valid() {
        let cfg = StrategyConfig::default().validated().unwrap();
        assert_eq!(cfg.thresholds.rsi_buy_ceiling, 30.0);
        assert_eq!(cfg.indicators.warmup_candles(), 33);
    }

    #[test]
    fn each_section_reports_its_own_error() {
        let mut cfg = StrategyConfig::default();
        cfg.thresholds.rsi_buy_ceiling = 45.0;
        assert!(matches!(cfg.validated(), Err(StrategyError::Thresholds(_))));

        let mut cfg = StrategyConfig::default();
        cfg.protective.stoploss = -1.5;
        assert!(matches!(cfg.validated(), Err(StrategyError::Protective(_))));

        let mut cfg = StrategyConfig::default();
        cfg.indicators.rsi_period = 0;
        let err = cfg.validated().unwrap_err();
        assert!(err.to_string().contains("rsi_period"));
    }
}
