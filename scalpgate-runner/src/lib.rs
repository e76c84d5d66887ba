//! Scalpgate Runner: replay orchestration on top of `scalpgate-core`.
//!
//! - TOML run configuration with command-line overrides
//! - CSV and synthetic candle loading
//! - Parallel per-instrument replay with failure isolation
//! - Trade metrics and JSON/CSV artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{BacktestSettings, ConfigError, RunConfig};
pub use data_loader::{generate_synthetic, load_csv, load_dir, InstrumentData, LoadError};
pub use export::{load_report, render_summary, save_artifacts};
pub use metrics::PerformanceMetrics;
pub use runner::{
    replay_instrument, run_replay, InstrumentFailure, InstrumentReport, ReplayReport, RunError,
    SCHEMA_VERSION,
};
