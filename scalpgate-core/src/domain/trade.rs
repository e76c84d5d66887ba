//! TradeRecord: a completed long round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decision::ExitReason;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub instrument_id: String,
    pub entry_tag: Option<String>,

    // ── Entry ──
    pub open_time: DateTime<Utc>,
    pub open_rate: f64,
    pub stake: f64,

    // ── Exit ──
    pub close_time: DateTime<Utc>,
    pub close_rate: f64,
    pub exit_reason: ExitReason,

    // ── PnL ──
    pub fee_paid: f64,
    /// Net profit in quote currency after fees on both sides.
    pub profit_abs: f64,
}

impl TradeRecord {
    /// Net profit as a fraction of the stake.
    pub fn profit_ratio(&self) -> f64 {
        if self.stake == 0.0 {
            return 0.0;
        }
        self.profit_abs / self.stake
    }

    pub fn hold_minutes(&self) -> f64 {
        (self.close_time - self.open_time).num_milliseconds() as f64 / 60_000.0
    }

    pub fn is_winner(&self) -> bool {
        self.profit_abs > 0.0
    }
}
