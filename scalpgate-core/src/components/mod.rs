//! The five decision components plus the protective exits and the model boundary.
//!
//! Every component is a pure function of its inputs; state lives in the
//! pipeline that drives them.

pub mod entry;
pub mod exit;
pub mod gates;
pub mod predictor;
pub mod protective;
pub mod sizer;
pub mod thresholds;

#[cfg(test)]
pub(crate) mod test_support;

pub use entry::{EntryChecks, EntrySignalEvaluator, ENTRY_TAG};
pub use exit::{crossed_below, ExitChecks, ExitSignalEvaluator};
pub use gates::{EntryConfirmationGate, ExitConfirmationGate};
pub use predictor::{PrecomputedPredictions, Predictor};
pub use protective::{
    check_protective, ProtectiveConfig, ProtectiveError, ProtectiveExit, RoiStep,
    TrailingStopConfig,
};
pub use sizer::PositionSizer;
pub use thresholds::{ThresholdConfig, ThresholdError, VolatilityTier};
