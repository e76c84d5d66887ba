//! Protective exits: stop-loss, trailing stop and the time-decaying ROI table.
//!
//! These run before the exit evaluator on every candle of an open position.
//! Their reasons are protective, so the exit gate never blocks them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Candle, ExitReason, TradeLifecycle};

/// Take profit once `min_profit` is reached after holding `after_minutes`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiStep {
    pub after_minutes: u32,
    pub min_profit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailingStopConfig {
    pub enabled: bool,
    /// Trail distance below the high watermark, as a fraction.
    pub positive: f64,
    /// Profit the high watermark must reach before the trail arms.
    pub positive_offset: f64,
    pub only_offset_is_reached: bool,
}

impl Default for TrailingStopConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            positive: 0.01,
            positive_offset: 0.02,
            only_offset_is_reached: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectiveConfig {
    /// Loss fraction that closes the position (negative, e.g. -0.05).
    pub stoploss: f64,
    pub minimal_roi: Vec<RoiStep>,
    pub trailing: TrailingStopConfig,
}

impl Default for ProtectiveConfig {
    fn default() -> Self {
        let roi = |after_minutes, min_profit| RoiStep {
            after_minutes,
            min_profit,
        };
        Self {
            stoploss: -0.05,
            minimal_roi: vec![roi(0, 0.05), roi(15, 0.03), roi(30, 0.02), roi(60, 0.01)],
            trailing: TrailingStopConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtectiveError {
    #[error("stoploss must be in (-1, 0), got {0}")]
    Stoploss(f64),
    #[error("minimal_roi has two steps at {0} minutes")]
    DuplicateRoiStep(u32),
    #[error("minimal_roi step at {after_minutes} minutes has non-finite profit {min_profit}")]
    RoiProfit { after_minutes: u32, min_profit: f64 },
    #[error("trailing stop {field} must be in (0, 1), got {value}")]
    Trailing { field: &'static str, value: f64 },
}

impl ProtectiveConfig {
    /// Validate and sort the ROI table by `after_minutes`.
    pub fn validated(mut self) -> Result<Self, ProtectiveError> {
        if !(self.stoploss > -1.0 && self.stoploss < 0.0) {
            return Err(ProtectiveError::Stoploss(self.stoploss));
        }
        self.minimal_roi.sort_by_key(|step| step.after_minutes);
        for pair in self.minimal_roi.windows(2) {
            if pair[0].after_minutes == pair[1].after_minutes {
                return Err(ProtectiveError::DuplicateRoiStep(pair[0].after_minutes));
            }
        }
        if let Some(step) = self.minimal_roi.iter().find(|s| !s.min_profit.is_finite()) {
            return Err(ProtectiveError::RoiProfit {
                after_minutes: step.after_minutes,
                min_profit: step.min_profit,
            });
        }
        if self.trailing.enabled {
            let t = self.trailing;
            for (field, value) in [("positive", t.positive), ("positive_offset", t.positive_offset)] {
                if !(value > 0.0 && value < 1.0) {
                    return Err(ProtectiveError::Trailing { field, value });
                }
            }
        }
        Ok(self)
    }

    /// ROI target for a position held `minutes`: the step with the greatest
    /// `after_minutes` not exceeding it.
    pub fn roi_target(&self, minutes: f64) -> Option<f64> {
        self.minimal_roi
            .iter()
            .filter(|step| f64::from(step.after_minutes) <= minutes)
            .max_by_key(|step| step.after_minutes)
            .map(|step| step.min_profit)
    }

    /// Current stop price and the reason it would report if hit.
    pub fn stop_price(&self, lifecycle: &TradeLifecycle) -> (f64, ExitReason) {
        let initial = lifecycle.open_rate * (1.0 + self.stoploss);
        let t = self.trailing;
        if !t.enabled {
            return (initial, ExitReason::StopLoss);
        }
        let armed = !t.only_offset_is_reached
            || lifecycle.max_rate >= lifecycle.open_rate * (1.0 + t.positive_offset);
        let trail = lifecycle.max_rate * (1.0 - t.positive);
        if armed && trail > initial {
            (trail, ExitReason::TrailingStop)
        } else {
            (initial, ExitReason::StopLoss)
        }
    }
}

/// A protective exit that fired, with the rate it fills at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectiveExit {
    pub reason: ExitReason,
    pub rate: f64,
}

/// Check stops (stop-loss, then trailing) against the candle low, then ROI
/// against the close. `lifecycle.max_rate` must already include this candle.
pub fn check_protective(
    lifecycle: &TradeLifecycle,
    candle: &Candle,
    cfg: &ProtectiveConfig,
) -> Option<ProtectiveExit> {
    let (stop, reason) = cfg.stop_price(lifecycle);
    if candle.low <= stop {
        // gapped through the stop: fill at the open
        let rate = if candle.open < stop { candle.open } else { stop };
        return Some(ProtectiveExit { reason, rate });
    }

    let held = lifecycle.minutes_held(candle.close_time)?;
    let target = cfg.roi_target(held)?;
    if lifecycle.profit_ratio(candle.close) >= target {
        return Some(ProtectiveExit {
            reason: ExitReason::Roi,
            rate: candle.close,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap()
    }

    fn candle(minutes_after_open: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        let close_time = t0() + Duration::minutes(minutes_after_open);
        Candle {
            instrument_id: "SOL/USDT".into(),
            open_time: close_time - Duration::minutes(5),
            close_time,
            open,
            high,
            low,
            close,
            volume: 100.0,
        }
    }

    fn lifecycle() -> TradeLifecycle {
        TradeLifecycle::open("SOL/USDT", t0(), 100.0, 100.0)
    }

    #[test]
    fn defaults_validate() {
        let cfg = ProtectiveConfig::default().validated().unwrap();
        assert_eq!(cfg.minimal_roi.len(), 4);
        assert_eq!(cfg.stoploss, -0.05);
    }

    #[test]
    fn roi_table_lookup() {
        let cfg = ProtectiveConfig::default();
        assert_eq!(cfg.roi_target(0.0), Some(0.05));
        assert_eq!(cfg.roi_target(14.9), Some(0.05));
        assert_eq!(cfg.roi_target(15.0), Some(0.03));
        assert_eq!(cfg.roi_target(45.0), Some(0.02));
        assert_eq!(cfg.roi_target(600.0), Some(0.01));
    }

    #[test]
    fn stop_loss_fires_on_low() {
        let cfg = ProtectiveConfig::default();
        let exit = check_protective(&lifecycle(), &candle(5, 99.0, 99.5, 94.0, 96.0), &cfg).unwrap();
        assert_eq!(exit.reason, ExitReason::StopLoss);
        assert_approx(exit.rate, 95.0, 1e-9);
    }

    #[test]
    fn gap_through_stop_fills_at_open() {
        let cfg = ProtectiveConfig::default();
        let exit = check_protective(&lifecycle(), &candle(5, 90.0, 91.0, 89.0, 90.5), &cfg).unwrap();
        assert_eq!(exit.reason, ExitReason::StopLoss);
        assert_eq!(exit.rate, 90.0);
    }

    #[test]
    fn trailing_arms_only_after_offset() {
        let cfg = ProtectiveConfig::default();
        let mut lc = lifecycle();
        lc.max_rate = 101.5; // below the 2% offset
        assert_eq!(cfg.stop_price(&lc).1, ExitReason::StopLoss);

        lc.max_rate = 103.0;
        let (stop, reason) = cfg.stop_price(&lc);
        assert_eq!(reason, ExitReason::TrailingStop);
        assert_approx(stop, 101.97, 1e-9);
    }

    #[test]
    fn trailing_stop_fires() {
        let cfg = ProtectiveConfig::default();
        let mut lc = lifecycle();
        lc.max_rate = 103.0;
        let exit = check_protective(&lc, &candle(10, 102.5, 102.6, 101.5, 102.0), &cfg).unwrap();
        assert_eq!(exit.reason, ExitReason::TrailingStop);
        assert_approx(exit.rate, 101.97, 1e-9);
    }

    #[test]
    fn roi_fires_on_close() {
        let cfg = ProtectiveConfig::default();
        let mut lc = lifecycle();
        lc.max_rate = 101.0;
        // 20 minutes in: 3% target; close 101 is only 1%
        assert_eq!(check_protective(&lc, &candle(20, 100.5, 101.0, 100.2, 101.0), &cfg), None);
        // 65 minutes in: 1% target reached
        let exit = check_protective(&lc, &candle(65, 100.5, 101.0, 100.2, 101.0), &cfg).unwrap();
        assert_eq!(exit.reason, ExitReason::Roi);
        assert_eq!(exit.rate, 101.0);
    }

    #[test]
    fn unknown_open_time_skips_roi() {
        let cfg = ProtectiveConfig::default();
        let mut lc = lifecycle();
        lc.open_time = None;
        assert_eq!(check_protective(&lc, &candle(65, 110.0, 111.0, 109.0, 110.0), &cfg), None);
    }

    #[test]
    fn invalid_configs_rejected() {
        let cfg = ProtectiveConfig {
            stoploss: 0.05,
            ..Default::default()
        };
        assert_eq!(cfg.validated(), Err(ProtectiveError::Stoploss(0.05)));

        let mut cfg = ProtectiveConfig::default();
        cfg.minimal_roi.push(RoiStep {
            after_minutes: 15,
            min_profit: 0.04,
        });
        assert_eq!(cfg.validated(), Err(ProtectiveError::DuplicateRoiStep(15)));

        let mut cfg = ProtectiveConfig::default();
        cfg.trailing.positive = 0.0;
        assert!(matches!(
            cfg.validated(),
            Err(ProtectiveError::Trailing { field: "positive", .. })
        ));
    }
}
