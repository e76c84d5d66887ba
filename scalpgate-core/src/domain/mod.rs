//! Domain types: candles, contexts, decisions, trade lifecycle and records.

pub mod candle;
pub mod context;
pub mod decision;
pub mod lifecycle;
pub mod trade;

pub use candle::Candle;
pub use context::{CandleContext, ModelOutput, ModelVerdict};
pub use decision::{Decision, ExitReason};
pub use lifecycle::{default_protective_reasons, TradeLifecycle};
pub use trade::TradeRecord;
