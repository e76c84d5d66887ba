//! Scalpgate Core: per-candle decision engine for a long-only scalping strategy.
//!
//! - Domain types (candles, contexts, decisions, trade lifecycle, trade records)
//! - Causal indicators feeding each `CandleContext`
//! - Entry/exit evaluators, the volatility-tiered position sizer and both
//!   confirmation gates
//! - Protective exits (stop-loss, trailing stop, ROI table)
//! - The per-instrument pipeline that strings them together

pub mod components;
pub mod domain;
pub mod engine;
pub mod indicators;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a parallel replay moves across threads
    /// is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::CandleContext>();
        require_sync::<domain::CandleContext>();
        require_send::<domain::Decision>();
        require_sync::<domain::Decision>();
        require_send::<domain::TradeLifecycle>();
        require_sync::<domain::TradeLifecycle>();
        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();

        require_send::<components::ThresholdConfig>();
        require_sync::<components::ThresholdConfig>();
        require_send::<components::ProtectiveConfig>();
        require_sync::<components::ProtectiveConfig>();
        require_send::<components::PrecomputedPredictions>();
        require_sync::<components::PrecomputedPredictions>();

        require_send::<engine::StrategyConfig>();
        require_sync::<engine::StrategyConfig>();
        require_send::<engine::InstrumentPipeline>();
        require_sync::<engine::InstrumentPipeline>();
    }

    /// Architecture contract: evaluators and gates never see the position
    /// book. Only the exit gate sees the single lifecycle it rules on.
    #[test]
    fn evaluators_take_contexts_only() {
        fn _entry(ctx: &domain::CandleContext, cfg: &components::ThresholdConfig) -> bool {
            components::EntrySignalEvaluator.evaluate(ctx, cfg)
        }
        fn _exit(
            prev: Option<&domain::CandleContext>,
            cur: &domain::CandleContext,
            cfg: &components::ThresholdConfig,
        ) -> bool {
            components::ExitSignalEvaluator.evaluate(prev, cur, cfg)
        }
    }
}
