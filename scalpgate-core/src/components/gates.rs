//! Confirmation gates: final vetoes before an order is submitted.
//!
//! Both gates are pure and idempotent. Neither creates nor mutates a
//! `TradeLifecycle`; that belongs to the caller once a gate confirms.

use chrono::{DateTime, Utc};

use super::thresholds::ThresholdConfig;
use crate::domain::{CandleContext, ExitReason, TradeLifecycle};

/// At order time, volume below this fraction of its rolling mean vetoes entry.
pub const CONFIRM_VOLUME_FRACTION: f64 = 0.5;

/// Re-validates data quality and liquidity on the freshest context available
/// at order time, which may postdate the candle that produced the signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryConfirmationGate;

impl EntryConfirmationGate {
    pub fn confirm(&self, ctx: &CandleContext, cfg: &ThresholdConfig) -> bool {
        // "not below" written as >= so a NaN on either side fails closed
        let quality_ok = ctx.model_confidence >= cfg.model_confidence_floor;
        let liquidity_ok = ctx.volume >= ctx.rolling_volume_mean * CONFIRM_VOLUME_FRACTION;
        quality_ok && liquidity_ok
    }
}

/// Enforces the minimum holding time for signal exits. Protective exits
/// always pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitConfirmationGate;

impl ExitConfirmationGate {
    /// Held time of exactly `min_hold_minutes` confirms; anything shorter rejects.
    pub fn confirm(
        &self,
        lifecycle: &TradeLifecycle,
        exit_reason: ExitReason,
        now: DateTime<Utc>,
        cfg: &ThresholdConfig,
    ) -> bool {
        if lifecycle.is_protective(exit_reason) {
            return true;
        }
        match lifecycle.minutes_held(now) {
            Some(held) => held >= cfg.min_hold_minutes,
            None => true,
        }
    }

    /// String-keyed variant for callers that carry venue exit reasons.
    /// Unknown reasons are treated as signal exits.
    pub fn confirm_named(
        &self,
        lifecycle: &TradeLifecycle,
        exit_reason: &str,
        now: DateTime<Utc>,
        cfg: &ThresholdConfig,
    ) -> bool {
        let reason = exit_reason.parse().unwrap_or(ExitReason::ExitSignal);
        self.confirm(lifecycle, reason, now, cfg)
    }
}
