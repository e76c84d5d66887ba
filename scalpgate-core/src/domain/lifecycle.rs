//! TradeLifecycle: state record of one open position.
//!
//! Created by the caller after the entry gate confirms, consulted by the exit
//! gate and protective checks, destroyed when the position closes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::candle::Candle;
use super::decision::ExitReason;

/// Exit reasons that must never be blocked by the holding-time gate.
pub fn default_protective_reasons() -> BTreeSet<ExitReason> {
    [ExitReason::StopLoss, ExitReason::Roi, ExitReason::TrailingStop]
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLifecycle {
    pub instrument_id: String,
    /// Unset when the venue did not report an open time.
    pub open_time: Option<DateTime<Utc>>,
    pub entry_tag: Option<String>,
    #[serde(default = "default_protective_reasons")]
    pub protective_exit_reasons: BTreeSet<ExitReason>,
    pub open_rate: f64,
    pub stake: f64,
    /// Highest price seen since entry. Only ever moves up.
    pub max_rate: f64,
}

impl TradeLifecycle {
    pub fn open(
        instrument_id: impl Into<String>,
        open_time: DateTime<Utc>,
        open_rate: f64,
        stake: f64,
    ) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            open_time: Some(open_time),
            entry_tag: None,
            protective_exit_reasons: default_protective_reasons(),
            open_rate,
            stake,
            max_rate: open_rate,
        }
    }

    pub fn with_entry_tag(mut self, tag: impl Into<String>) -> Self {
        self.entry_tag = Some(tag.into());
        self
    }

    pub fn is_protective(&self, reason: ExitReason) -> bool {
        self.protective_exit_reasons.contains(&reason)
    }

    /// Ratchet `max_rate` with the candle's high.
    pub fn observe(&mut self, candle: &Candle) {
        if !candle.high.is_nan() && candle.high > self.max_rate {
            self.max_rate = candle.high;
        }
    }

    /// Profit of the position as a fraction of the open rate at `rate`.
    pub fn profit_ratio(&self, rate: f64) -> f64 {
        if self.open_rate <= 0.0 {
            return 0.0;
        }
        rate / self.open_rate - 1.0
    }

    /// Minutes held at `now`, or None when the open time is unknown.
    pub fn minutes_held(&self, now: DateTime<Utc>) -> Option<f64> {
        self.open_time
            .map(|open| (now - open).num_milliseconds() as f64 / 60_000.0)
    }
}
