//! Performance metrics: pure functions over closed trades.
//!
//! The equity curve is the initial capital plus realised profit, stepped at
//! each trade's close time. No mark-to-market of open positions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scalpgate_core::domain::{ExitReason, TradeRecord};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub trade_count: usize,
    pub win_rate: f64,
    pub total_profit_abs: f64,
    /// Total profit as a fraction of initial capital.
    pub total_profit_pct: f64,
    pub profit_factor: f64,
    pub avg_profit_ratio: f64,
    pub avg_hold_minutes: f64,
    /// Largest peak-to-trough fall of the realised equity curve, as a
    /// negative fraction.
    pub max_drawdown: f64,
    pub exit_reason_counts: BTreeMap<ExitReason, usize>,
}

impl PerformanceMetrics {
    pub fn compute(trades: &[TradeRecord], initial_capital: f64) -> Self {
        let total = total_profit(trades);
        Self {
            trade_count: trades.len(),
            win_rate: win_rate(trades),
            total_profit_abs: total,
            total_profit_pct: if initial_capital > 0.0 {
                total / initial_capital
            } else {
                0.0
            },
            profit_factor: profit_factor(trades),
            avg_profit_ratio: mean(trades.iter().map(TradeRecord::profit_ratio)),
            avg_hold_minutes: mean(trades.iter().map(TradeRecord::hold_minutes)),
            max_drawdown: max_drawdown(&equity_curve(trades, initial_capital)),
            exit_reason_counts: exit_reason_counts(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

pub fn total_profit(trades: &[TradeRecord]) -> f64 {
    trades.iter().map(|t| t.profit_abs).sum()
}

/// Fraction of trades with positive net profit.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Gross profit / gross loss, capped at 100.0.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.profit_abs > 0.0)
        .map(|t| t.profit_abs)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.profit_abs < 0.0)
        .map(|t| t.profit_abs.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Realised equity after each close, starting with `initial_capital`.
/// Trades are ordered by close time, so trades from several instruments
/// interleave correctly.
pub fn equity_curve(trades: &[TradeRecord], initial_capital: f64) -> Vec<f64> {
    let mut ordered: Vec<&TradeRecord> = trades.iter().collect();
    ordered.sort_by(|a, b| {
        a.close_time
            .cmp(&b.close_time)
            .then_with(|| a.instrument_id.cmp(&b.instrument_id))
    });

    let mut equity = initial_capital;
    let mut curve = Vec::with_capacity(trades.len() + 1);
    curve.push(equity);
    for trade in ordered {
        equity += trade.profit_abs;
        curve.push(equity);
    }
    curve
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

pub fn exit_reason_counts(trades: &[TradeRecord]) -> BTreeMap<ExitReason, usize> {
    let mut counts = BTreeMap::new();
    for trade in trades {
        *counts.entry(trade.exit_reason).or_insert(0) += 1;
    }
    counts
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}
