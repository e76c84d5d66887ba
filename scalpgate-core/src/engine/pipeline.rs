//! Per-instrument decision pipeline.
//!
//! One `InstrumentPipeline` owns everything stateful for one instrument: the
//! last accepted snapshot and the open position, if any. The snapshot is the
//! previous sample for crossing checks on the next candle. Each closed candle
//! runs exactly one pass and yields one `Decision`.
//!
//! Flat:        entry evaluator -> entry gate -> position sizer -> `EnterLong`
//! In position: protective exits, else exit evaluator -> exit gate -> `ExitLong`

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use super::strategy::StrategyConfig;
use crate::components::{
    check_protective, EntryConfirmationGate, EntrySignalEvaluator, ExitConfirmationGate,
    ExitSignalEvaluator, PositionSizer, ENTRY_TAG,
};
use crate::domain::{Candle, CandleContext, Decision, ExitReason, ModelVerdict, TradeLifecycle};

/// Source of the freshest context at order time.
pub trait ContextFeed {
    fn latest(&self, instrument_id: &str) -> Option<CandleContext>;
}

/// Feed with nothing newer than the signal candle. Replays use this.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeed;

impl ContextFeed for NoFeed {
    fn latest(&self, _instrument_id: &str) -> Option<CandleContext> {
        None
    }
}

impl ContextFeed for HashMap<String, CandleContext> {
    fn latest(&self, instrument_id: &str) -> Option<CandleContext> {
        self.get(instrument_id).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("{instrument}: candle closing {got} is older than the last seen {last}")]
    OutOfOrder {
        instrument: String,
        last: DateTime<Utc>,
        got: DateTime<Utc>,
    },
    #[error("{instrument}: duplicate candle closing {at}")]
    Duplicate {
        instrument: String,
        at: DateTime<Utc>,
    },
    #[error("pipeline for {expected} received data for {got}")]
    InstrumentMismatch { expected: String, got: String },
    #[error("{instrument}: context closes {context} but candle closes {candle}")]
    ContextMismatch {
        instrument: String,
        candle: DateTime<Utc>,
        context: DateTime<Utc>,
    },
}

/// A position the pipeline just closed, with the fill it closed at.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedPosition {
    pub lifecycle: TradeLifecycle,
    pub close_time: DateTime<Utc>,
    pub close_rate: f64,
    pub reason: ExitReason,
}

/// Result of one pass over one candle.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStep {
    pub decision: Decision,
    pub closed: Option<ClosedPosition>,
}

impl PipelineStep {
    fn hold() -> Self {
        Self {
            decision: Decision::NoAction,
            closed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstrumentPipeline {
    instrument_id: String,
    config: Arc<StrategyConfig>,
    current: Option<CandleContext>,
    position: Option<TradeLifecycle>,
}

impl InstrumentPipeline {
    pub fn new(instrument_id: impl Into<String>, config: Arc<StrategyConfig>) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            config,
            current: None,
            position: None,
        }
    }

    pub fn instrument_id(&self) -> &str {
        &self.instrument_id
    }

    pub fn position(&self) -> Option<&TradeLifecycle> {
        self.position.as_ref()
    }

    /// Most recent context accepted by the pipeline.
    pub fn last_snapshot(&self) -> Option<&CandleContext> {
        self.current.as_ref()
    }

    /// Run one decision pass. A rejected candle leaves the pipeline untouched.
    pub fn on_candle(
        &mut self,
        candle: &Candle,
        ctx: CandleContext,
        feed: &dyn ContextFeed,
        proposed_stake: f64,
    ) -> Result<PipelineStep, PipelineError> {
        self.admit(candle, &ctx)?;

        let previous = self.current.take();
        let (step, position) = match self.position.take() {
            Some(lifecycle) => {
                manage_position(&self.config, lifecycle, candle, previous.as_ref(), &ctx)
            }
            None => consider_entry(&self.config, candle, &ctx, feed, proposed_stake),
        };

        debug!(
            instrument = %self.instrument_id,
            close_time = %candle.close_time,
            decision = ?step.decision,
            "decision"
        );

        self.position = position;
        self.current = Some(ctx);
        Ok(step)
    }

    /// Close any open position at the last accepted close. Used at end of data,
    /// so the minimum-hold gate does not apply.
    pub fn force_exit(&mut self) -> Option<ClosedPosition> {
        let ctx = self.current.as_ref()?;
        let lifecycle = self.position.take()?;
        debug!(instrument = %self.instrument_id, close_time = %ctx.candle_close_time, "force exit");
        Some(ClosedPosition {
            lifecycle,
            close_time: ctx.candle_close_time,
            close_rate: ctx.close,
            reason: ExitReason::ForceExit,
        })
    }

    fn admit(&self, candle: &Candle, ctx: &CandleContext) -> Result<(), PipelineError> {
        for got in [&candle.instrument_id, &ctx.instrument_id] {
            if *got != self.instrument_id {
                return Err(PipelineError::InstrumentMismatch {
                    expected: self.instrument_id.clone(),
                    got: got.clone(),
                });
            }
        }
        if ctx.candle_close_time != candle.close_time {
            return Err(PipelineError::ContextMismatch {
                instrument: self.instrument_id.clone(),
                candle: candle.close_time,
                context: ctx.candle_close_time,
            });
        }
        if let Some(last) = self.current.as_ref().map(|c| c.candle_close_time) {
            if candle.close_time == last {
                return Err(PipelineError::Duplicate {
                    instrument: self.instrument_id.clone(),
                    at: last,
                });
            }
            if candle.close_time < last {
                return Err(PipelineError::OutOfOrder {
                    instrument: self.instrument_id.clone(),
                    last,
                    got: candle.close_time,
                });
            }
        }
        Ok(())
    }
}

fn consider_entry(
    config: &StrategyConfig,
    candle: &Candle,
    ctx: &CandleContext,
    feed: &dyn ContextFeed,
    proposed_stake: f64,
) -> (PipelineStep, Option<TradeLifecycle>) {
    let thresholds = &config.thresholds;
    // no entries until every feature has warmed up
    if ctx.has_missing_data() {
        return (PipelineStep::hold(), None);
    }
    if !EntrySignalEvaluator.evaluate(ctx, thresholds) {
        if ctx.model_class_verdict == ModelVerdict::Favorable {
            debug!(
                instrument = %ctx.instrument_id,
                failed = ?EntrySignalEvaluator.checks(ctx, thresholds).failures(),
                "favorable model verdict filtered out"
            );
        }
        return (PipelineStep::hold(), None);
    }

    let order_ctx = freshest(ctx, feed);
    if !EntryConfirmationGate.confirm(&order_ctx, thresholds) {
        debug!(instrument = %ctx.instrument_id, "entry signal vetoed by confirmation gate");
        return (PipelineStep::hold(), None);
    }

    let stake = PositionSizer.size(proposed_stake, order_ctx.atr, order_ctx.close, thresholds);
    let lifecycle = TradeLifecycle::open(
        ctx.instrument_id.clone(),
        candle.close_time,
        candle.close,
        stake,
    )
    .with_entry_tag(ENTRY_TAG);
    let step = PipelineStep {
        decision: Decision::EnterLong { sizing_hint: stake },
        closed: None,
    };
    (step, Some(lifecycle))
}

fn manage_position(
    config: &StrategyConfig,
    mut lifecycle: TradeLifecycle,
    candle: &Candle,
    previous: Option<&CandleContext>,
    ctx: &CandleContext,
) -> (PipelineStep, Option<TradeLifecycle>) {
    let thresholds = &config.thresholds;
    let now = candle.close_time;
    lifecycle.observe(candle);

    if let Some(exit) = check_protective(&lifecycle, candle, &config.protective) {
        if ExitConfirmationGate.confirm(&lifecycle, exit.reason, now, thresholds) {
            return close(lifecycle, now, exit.rate, exit.reason);
        }
    }

    if ExitSignalEvaluator.evaluate(previous, ctx, thresholds) {
        let triggered = ExitSignalEvaluator.checks(previous, ctx, thresholds).triggered();
        if ExitConfirmationGate.confirm(&lifecycle, ExitReason::ExitSignal, now, thresholds) {
            debug!(instrument = %ctx.instrument_id, ?triggered, "exit signal confirmed");
            return close(lifecycle, now, candle.close, ExitReason::ExitSignal);
        }
        debug!(
            instrument = %ctx.instrument_id,
            ?triggered,
            "exit signal held back until minimum hold"
        );
    }

    (PipelineStep::hold(), Some(lifecycle))
}

fn close(
    lifecycle: TradeLifecycle,
    close_time: DateTime<Utc>,
    close_rate: f64,
    reason: ExitReason,
) -> (PipelineStep, Option<TradeLifecycle>) {
    let step = PipelineStep {
        decision: Decision::ExitLong { reason },
        closed: Some(ClosedPosition {
            lifecycle,
            close_time,
            close_rate,
            reason,
        }),
    };
    (step, None)
}

/// Freshest context for the order. A feed context older than the signal
/// snapshot is ignored in favour of the snapshot.
fn freshest<'a>(signal: &'a CandleContext, feed: &dyn ContextFeed) -> Cow<'a, CandleContext> {
    match feed.latest(&signal.instrument_id) {
        Some(fresh) if fresh.candle_close_time >= signal.candle_close_time => Cow::Owned(fresh),
        Some(stale) => {
            warn!(
                instrument = %signal.instrument_id,
                feed_close_time = %stale.candle_close_time,
                signal_close_time = %signal.candle_close_time,
                "context feed is behind the signal snapshot, using the snapshot"
            );
            Cow::Borrowed(signal)
        }
        None => Cow::Borrowed(signal),
    }
}
