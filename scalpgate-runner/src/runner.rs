//! Replay runner: drives one `InstrumentPipeline` per instrument over
//! historical candles and turns confirmed decisions into simulated trades.
//!
//! Instruments run in parallel on the rayon pool. Each instrument's candles
//! are processed strictly in time order by a single pipeline, and a failure in
//! one instrument is recorded without affecting the others.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use scalpgate_core::domain::{Decision, TradeRecord};
use scalpgate_core::engine::{
    build_contexts, decision_digest, ClosedPosition, InstrumentPipeline, NoFeed, StrategyConfig,
    StrategyError,
};

use crate::config::BacktestSettings;
use crate::data_loader::InstrumentData;
use crate::metrics::PerformanceMetrics;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("{instrument}: no candles")]
    NoCandles { instrument: String },
    #[error("{instrument}: {got} candles, at least {needed} needed to warm up indicators")]
    InsufficientHistory {
        instrument: String,
        needed: usize,
        got: usize,
    },
    #[error("no instruments to replay")]
    NoInstruments,
    #[error("invalid strategy: {0}")]
    Strategy(#[from] StrategyError),
}

/// Per-instrument replay result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentReport {
    pub instrument_id: String,
    pub synthetic: bool,
    pub candle_count: usize,
    /// Candles the pipeline rejected (out of order or duplicate).
    pub rejected_candles: usize,
    pub entries: usize,
    pub exits: usize,
    pub decision_digest: String,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<TradeRecord>,
    #[serde(skip)]
    pub decisions: Vec<Decision>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentFailure {
    pub instrument_id: String,
    pub error: String,
}

/// Result of a whole replay, sorted by instrument id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub strategy: StrategyConfig,
    pub backtest: BacktestSettings,
    pub instruments: Vec<InstrumentReport>,
    pub failures: Vec<InstrumentFailure>,
    /// Metrics over every instrument's trades against one shared capital.
    pub totals: PerformanceMetrics,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl ReplayReport {
    pub fn all_trades(&self) -> Vec<TradeRecord> {
        self.instruments
            .iter()
            .flat_map(|r| r.trades.iter().cloned())
            .collect()
    }

    /// True when instruments were requested and none of them replayed.
    pub fn all_failed(&self) -> bool {
        self.instruments.is_empty() && !self.failures.is_empty()
    }
}

/// Replay every instrument in parallel.
///
/// The strategy is validated before any instrument starts, so a bad config
/// fails the whole run instead of panicking inside a worker.
pub fn run_replay(
    instruments: &[InstrumentData],
    strategy: &StrategyConfig,
    settings: &BacktestSettings,
) -> Result<ReplayReport, RunError> {
    if instruments.is_empty() {
        return Err(RunError::NoInstruments);
    }
    let strategy = strategy.clone().validated()?;
    let shared = Arc::new(strategy.clone());
    let results: Vec<(String, Result<InstrumentReport, RunError>)> = instruments
        .par_iter()
        .map(|data| {
            let result = replay_instrument(data, Arc::clone(&shared), settings);
            (data.instrument_id.clone(), result)
        })
        .collect();

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for (instrument_id, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(err) => {
                warn!(instrument = %instrument_id, error = %err, "instrument replay failed");
                failures.push(InstrumentFailure {
                    instrument_id,
                    error: err.to_string(),
                });
            }
        }
    }
    reports.sort_by(|a, b| a.instrument_id.cmp(&b.instrument_id));
    failures.sort_by(|a, b| a.instrument_id.cmp(&b.instrument_id));

    let all_trades: Vec<TradeRecord> = reports.iter().flat_map(|r| r.trades.clone()).collect();
    let totals = PerformanceMetrics::compute(&all_trades, settings.initial_capital);

    Ok(ReplayReport {
        schema_version: SCHEMA_VERSION,
        strategy,
        backtest: settings.clone(),
        instruments: reports,
        failures,
        totals,
    })
}

/// Replay one instrument from its first candle to its last.
pub fn replay_instrument(
    data: &InstrumentData,
    strategy: Arc<StrategyConfig>,
    settings: &BacktestSettings,
) -> Result<InstrumentReport, RunError> {
    let id = &data.instrument_id;
    if data.candles.is_empty() {
        return Err(RunError::NoCandles {
            instrument: id.clone(),
        });
    }
    let needed = strategy.indicators.warmup_candles() + 1;
    if data.candles.len() < needed {
        return Err(RunError::InsufficientHistory {
            instrument: id.clone(),
            needed,
            got: data.candles.len(),
        });
    }

    let contexts = build_contexts(&data.candles, &strategy.indicators, &data.predictions);
    let mut pipeline = InstrumentPipeline::new(id.clone(), strategy);
    let mut decisions = Vec::with_capacity(data.candles.len());
    let mut trades = Vec::new();
    let mut rejected = 0usize;

    for (candle, ctx) in data.candles.iter().zip(contexts) {
        match pipeline.on_candle(candle, ctx, &NoFeed, settings.stake_amount) {
            Ok(step) => {
                decisions.push(step.decision);
                if let Some(closed) = step.closed {
                    trades.push(settle(closed, settings.fee));
                }
            }
            Err(err) => {
                warn!(instrument = %id, error = %err, "candle rejected");
                rejected += 1;
            }
        }
    }
    if let Some(closed) = pipeline.force_exit() {
        trades.push(settle(closed, settings.fee));
    }

    let metrics = PerformanceMetrics::compute(&trades, settings.initial_capital);
    let entries = decisions.iter().filter(|d| d.is_entry()).count();
    let exits = decisions.iter().filter(|d| d.is_exit()).count();
    info!(
        instrument = %id,
        candles = data.candles.len(),
        trades = trades.len(),
        profit = metrics.total_profit_abs,
        "replay finished"
    );

    Ok(InstrumentReport {
        instrument_id: id.clone(),
        synthetic: data.synthetic,
        candle_count: data.candles.len(),
        rejected_candles: rejected,
        entries,
        exits,
        decision_digest: decision_digest(&decisions),
        metrics,
        trades,
        decisions,
    })
}

/// Turn a closed position into a trade record, charging `fee` on each side.
pub fn settle(closed: ClosedPosition, fee: f64) -> TradeRecord {
    let lc = closed.lifecycle;
    let amount = if lc.open_rate > 0.0 {
        lc.stake / lc.open_rate
    } else {
        0.0
    };
    let open_fee = lc.stake * fee;
    let close_value = amount * closed.close_rate;
    let close_fee = close_value * fee;
    let open_time = lc.open_time.unwrap_or(closed.close_time);

    TradeRecord {
        instrument_id: lc.instrument_id,
        entry_tag: lc.entry_tag,
        open_time,
        open_rate: lc.open_rate,
        stake: lc.stake,
        close_time: closed.close_time,
        close_rate: closed.close_rate,
        exit_reason: closed.reason,
        fee_paid: open_fee + close_fee,
        profit_abs: close_value - close_fee - lc.stake - open_fee,
    }
}

/// Count of decisions by kind, for log summaries.
pub fn decision_counts(decisions: &[Decision]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for decision in decisions {
        let key = match decision {
            Decision::NoAction => "no_action",
            Decision::EnterLong { .. } => "enter_long",
            Decision::ExitLong { .. } => "exit_long",
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}
