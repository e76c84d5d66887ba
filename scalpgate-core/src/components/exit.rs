//! Exit signal evaluator: OR over model reversal, overbought RSI and two crossings.
//!
//! Any single warning sign is enough to exit. The crossing checks need the
//! previous candle's context; without it they are false. A candle the model
//! produced nothing for is not an unfavorable verdict. Protective exits
//! (stop-loss, ROI, trailing stop) are not handled here.

use serde::{Deserialize, Serialize};

use super::thresholds::ThresholdConfig;
use crate::domain::{CandleContext, ModelVerdict};

/// Series `a` crosses from above-or-equal to below series `b`.
///
/// False whenever any of the four samples is NaN.
pub fn crossed_below(prev_a: f64, prev_b: f64, cur_a: f64, cur_b: f64) -> bool {
    prev_a >= prev_b && cur_a < cur_b
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitChecks {
    pub model_unfavorable: bool,
    /// `None` when the RSI exit is disabled.
    pub rsi_above_floor: Option<bool>,
    pub close_crossed_below_ema_fast: bool,
    pub macd_crossed_below_signal: bool,
}

impl ExitChecks {
    pub fn any_triggered(&self) -> bool {
        self.model_unfavorable
            || self.rsi_above_floor.unwrap_or(false)
            || self.close_crossed_below_ema_fast
            || self.macd_crossed_below_signal
    }

    /// Names of the triggered checks, in evaluation order.
    pub fn triggered(&self) -> Vec<&'static str> {
        [
            ("model_unfavorable", self.model_unfavorable),
            ("rsi_above_floor", self.rsi_above_floor.unwrap_or(false)),
            ("close_crossed_below_ema_fast", self.close_crossed_below_ema_fast),
            ("macd_crossed_below_signal", self.macd_crossed_below_signal),
        ]
        .into_iter()
        .filter(|(_, hit)| *hit)
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExitSignalEvaluator;

impl ExitSignalEvaluator {
    /// True if any exit condition holds on `current`, given the `previous` candle.
    pub fn evaluate(
        &self,
        previous: Option<&CandleContext>,
        current: &CandleContext,
        cfg: &ThresholdConfig,
    ) -> bool {
        model_unfavorable(current)
            || (cfg.rsi_sell_enabled && current.rsi > cfg.rsi_sell_floor)
            || previous.is_some_and(|prev| close_crossed_below_ema(prev, current))
            || previous.is_some_and(|prev| macd_crossed_below_signal(prev, current))
    }

    /// Evaluate every check without short-circuiting, for diagnostics.
    pub fn checks(
        &self,
        previous: Option<&CandleContext>,
        current: &CandleContext,
        cfg: &ThresholdConfig,
    ) -> ExitChecks {
        ExitChecks {
            model_unfavorable: model_unfavorable(current),
            rsi_above_floor: cfg.rsi_sell_enabled.then(|| current.rsi > cfg.rsi_sell_floor),
            close_crossed_below_ema_fast: previous
                .is_some_and(|prev| close_crossed_below_ema(prev, current)),
            macd_crossed_below_signal: previous
                .is_some_and(|prev| macd_crossed_below_signal(prev, current)),
        }
    }
}

fn model_unfavorable(ctx: &CandleContext) -> bool {
    ctx.has_model_output() && ctx.model_class_verdict == ModelVerdict::Unfavorable
}

fn close_crossed_below_ema(prev: &CandleContext, cur: &CandleContext) -> bool {
    crossed_below(prev.close, prev.ema_fast, cur.close, cur.ema_fast)
}

fn macd_crossed_below_signal(prev: &CandleContext, cur: &CandleContext) -> bool {
    crossed_below(prev.macd, prev.macd_signal, cur.macd, cur.macd_signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::test_support::entry_ready_context;

    fn quiet_pair() -> (CandleContext, CandleContext) {
        let prev = entry_ready_context();
        let mut cur = entry_ready_context();
        cur.candle_close_time = prev.candle_close_time + chrono::Duration::minutes(5);
        (prev, cur)
    }

    #[test]
    fn quiet_market_holds() {
        let cfg = ThresholdConfig::default();
        let (prev, cur) = quiet_pair();
        assert!(!ExitSignalEvaluator.evaluate(Some(&prev), &cur, &cfg));
        assert!(ExitSignalEvaluator.checks(Some(&prev), &cur, &cfg).triggered().is_empty());
    }

    #[test]
    fn model_reversal_exits() {
        let cfg = ThresholdConfig::default();
        let (prev, mut cur) = quiet_pair();
        cur.model_class_verdict = ModelVerdict::Unfavorable;
        assert!(ExitSignalEvaluator.evaluate(Some(&prev), &cur, &cfg));
    }

    #[test]
    fn absent_model_output_is_not_a_reversal() {
        let cfg = ThresholdConfig::default();
        let (prev, mut cur) = quiet_pair();
        let missing = crate::domain::ModelOutput::missing();
        cur.model_class_verdict = missing.verdict;
        cur.model_confidence = missing.confidence;
        assert!(!ExitSignalEvaluator.evaluate(Some(&prev), &cur, &cfg));
        assert!(!ExitSignalEvaluator.checks(Some(&prev), &cur, &cfg).model_unfavorable);
    }

    #[test]
    fn overbought_rsi_respects_toggle() {
        let mut cfg = ThresholdConfig::default();
        let (prev, mut cur) = quiet_pair();
        cur.rsi = 75.0;
        assert!(ExitSignalEvaluator.evaluate(Some(&prev), &cur, &cfg));
        cfg.rsi_sell_enabled = false;
        assert!(!ExitSignalEvaluator.evaluate(Some(&prev), &cur, &cfg));

        cfg.rsi_sell_enabled = true;
        cur.rsi = 70.0;
        assert!(!ExitSignalEvaluator.evaluate(Some(&prev), &cur, &cfg));
    }

    #[test]
    fn close_crossing_below_ema_exits() {
        let cfg = ThresholdConfig::default();
        let (mut prev, mut cur) = quiet_pair();
        prev.close = 99.0;
        prev.ema_fast = 99.0; // equal counts as above-or-equal
        cur.close = 98.5;
        cur.ema_fast = 99.0;
        assert!(ExitSignalEvaluator.evaluate(Some(&prev), &cur, &cfg));
        assert_eq!(
            ExitSignalEvaluator.checks(Some(&prev), &cur, &cfg).triggered(),
            vec!["close_crossed_below_ema_fast"]
        );
    }

    #[test]
    fn staying_below_ema_is_not_a_cross() {
        let cfg = ThresholdConfig::default();
        let (mut prev, mut cur) = quiet_pair();
        prev.close = 98.0;
        prev.ema_fast = 99.0;
        cur.close = 98.5;
        cur.ema_fast = 99.0;
        assert!(!ExitSignalEvaluator.evaluate(Some(&prev), &cur, &cfg));
    }

    #[test]
    fn macd_crossing_below_signal_exits() {
        let cfg = ThresholdConfig::default();
        let (mut prev, mut cur) = quiet_pair();
        prev.macd = 0.4;
        prev.macd_signal = 0.3;
        cur.macd = 0.2;
        cur.macd_signal = 0.3;
        assert!(ExitSignalEvaluator.evaluate(Some(&prev), &cur, &cfg));
    }

    #[test]
    fn crossings_need_previous_context() {
        let cfg = ThresholdConfig::default();
        let (_, mut cur) = quiet_pair();
        cur.close = 90.0;
        cur.macd = -1.0;
        assert!(!ExitSignalEvaluator.evaluate(None, &cur, &cfg));
    }

    #[test]
    fn nan_never_triggers() {
        assert!(!crossed_below(f64::NAN, 1.0, 0.5, 1.0));
        assert!(!crossed_below(2.0, 1.0, 0.5, f64::NAN));

        let cfg = ThresholdConfig::default();
        let (prev, mut cur) = quiet_pair();
        cur.rsi = f64::NAN;
        cur.ema_fast = f64::NAN;
        cur.macd_signal = f64::NAN;
        assert!(!ExitSignalEvaluator.evaluate(Some(&prev), &cur, &cfg));
    }
}
