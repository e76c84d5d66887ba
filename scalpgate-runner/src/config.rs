//! Run configuration loaded from TOML.
//!
//! ```toml
//! [thresholds]   # entry/exit thresholds, min hold, volatility tiers
//! [protective]   # stoploss, minimal_roi, trailing
//! [indicators]   # indicator periods
//! [backtest]     # capital, stake, fee, timeframe
//! ```
//!
//! Every key is optional. `--set section.key=value` overrides are applied to
//! the parsed document before deserialization, so they go through the same
//! validation as file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use scalpgate_core::engine::{StrategyConfig, StrategyError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("bad override '{0}': expected section.key=value")]
    BadOverride(String),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    #[error("invalid backtest settings: {0}")]
    Backtest(String),
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Simulation settings for a replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_capital: f64,
    /// Stake proposed to the sizer for every entry, in quote currency.
    pub stake_amount: f64,
    /// Fee per side as a fraction of traded value.
    pub fee: f64,
    pub timeframe_minutes: u32,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_capital: 1_000.0,
            stake_amount: 100.0,
            fee: 0.001,
            timeframe_minutes: 5,
        }
    }
}

impl BacktestSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::Backtest(msg));
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return fail(format!("initial_capital must be positive, got {}", self.initial_capital));
        }
        if !(self.stake_amount.is_finite() && self.stake_amount > 0.0) {
            return fail(format!("stake_amount must be positive, got {}", self.stake_amount));
        }
        if self.stake_amount > self.initial_capital {
            return fail(format!(
                "stake_amount {} exceeds initial_capital {}",
                self.stake_amount, self.initial_capital
            ));
        }
        if !(0.0..0.1).contains(&self.fee) {
            return fail(format!("fee must be in [0, 0.1), got {}", self.fee));
        }
        if self.timeframe_minutes == 0 {
            return fail("timeframe_minutes must be >= 1".into());
        }
        Ok(())
    }
}

/// Complete run configuration: strategy sections plus backtest settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(flatten)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub backtest: BacktestSettings,
}

impl RunConfig {
    /// Load from an optional file, apply overrides, validate.
    pub fn load(path: Option<&Path>, overrides: &[String]) -> Result<Self, ConfigError> {
        let text = match path {
            Some(path) => std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?,
            None => String::new(),
        };
        Self::from_toml_str(&text, overrides)
    }

    pub fn from_toml_str(text: &str, overrides: &[String]) -> Result<Self, ConfigError> {
        let mut doc: toml::Table = toml::from_str(text)?;
        for raw in overrides {
            apply_override(&mut doc, raw)?;
        }
        let config: RunConfig = toml::Value::Table(doc).try_into()?;
        config.validated()
    }

    pub fn validated(self) -> Result<Self, ConfigError> {
        self.backtest.validate()?;
        Ok(Self {
            strategy: self.strategy.validated()?,
            backtest: self.backtest,
        })
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Content hash of the effective configuration.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let canonical = self.to_toml_string()?;
        Ok(blake3::hash(canonical.as_bytes()).to_hex().to_string())
    }
}

/// Apply one `a.b.c=value` override. The value is parsed as a TOML value and
/// falls back to a bare string.
fn apply_override(doc: &mut toml::Table, raw: &str) -> Result<(), ConfigError> {
    let bad = || ConfigError::BadOverride(raw.to_string());
    let (path, value) = raw.split_once('=').ok_or_else(bad)?;
    let keys: Vec<&str> = path.trim().split('.').map(str::trim).collect();
    if keys.iter().any(|k| k.is_empty()) {
        return Err(bad());
    }
    let value = parse_value(value.trim());

    let (last, parents) = keys.split_last().ok_or_else(bad)?;
    let mut table = doc;
    for key in parents {
        let entry = table
            .entry(key.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        table = entry.as_table_mut().ok_or_else(bad)?;
    }
    table.insert(last.to_string(), value);
    Ok(())
}

fn parse_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}
