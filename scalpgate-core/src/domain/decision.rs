//! Decision: the output of one pipeline pass over one candle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a position is being closed.
///
/// Stop-loss, ROI and trailing-stop exits are protective; the confirmation gate
/// never blocks them. `ExitSignal` comes from the exit evaluator. `ForceExit`
/// flattens positions at the end of a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    Roi,
    #[serde(rename = "trailing_stop_loss")]
    TrailingStop,
    ExitSignal,
    ForceExit,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StopLoss => "stop_loss",
            Self::Roi => "roi",
            Self::TrailingStop => "trailing_stop_loss",
            Self::ExitSignal => "exit_signal",
            Self::ForceExit => "force_exit",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExitReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stop_loss" => Ok(Self::StopLoss),
            "roi" | "take_profit" => Ok(Self::Roi),
            "trailing_stop_loss" | "trailing_stop" => Ok(Self::TrailingStop),
            "exit_signal" => Ok(Self::ExitSignal),
            "force_exit" => Ok(Self::ForceExit),
            other => Err(format!("unknown exit reason '{other}'")),
        }
    }
}

/// Final action for one candle of one instrument.
///
/// Derived data: holds no reference to the context it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    NoAction,
    EnterLong { sizing_hint: f64 },
    ExitLong { reason: ExitReason },
}

impl Decision {
    pub fn is_entry(&self) -> bool {
        matches!(self, Self::EnterLong { .. })
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Self::ExitLong { .. })
    }
}
