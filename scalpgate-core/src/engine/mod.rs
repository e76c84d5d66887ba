//! Decision engine: strategy configuration, context precomputation, the
//! per-instrument pipeline and the replay digest.

pub mod digest;
pub mod pipeline;
pub mod precompute;
pub mod strategy;

pub use digest::decision_digest;
pub use pipeline::{
    ClosedPosition, ContextFeed, InstrumentPipeline, NoFeed, PipelineError, PipelineStep,
};
pub use precompute::build_contexts;
pub use strategy::{StrategyConfig, StrategyError};
