//! Scalpgate CLI: replay the decision engine over historical candles.
//!
//! Commands:
//! - `run` replays CSV data or a synthetic universe and writes artifacts
//! - `check-config` loads and validates a config, printing the effective values
//! - `defaults` prints the default config as TOML

mod logging;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use scalpgate_runner::runner::decision_counts;
use scalpgate_runner::{
    generate_synthetic, load_dir, render_summary, run_replay, save_artifacts, InstrumentData,
    RunConfig,
};

#[derive(Parser)]
#[command(
    name = "scalpgate",
    version,
    about = "Scalpgate: model-gated scalping decision engine with replay"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the strategy over candle data and write report artifacts.
    Run {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of per-instrument CSV files.
        #[arg(long, conflicts_with = "synthetic")]
        data: Option<PathBuf>,

        /// Generate N synthetic candles per instrument instead of loading data.
        #[arg(long, value_name = "N")]
        synthetic: Option<usize>,

        /// Comma-separated instrument ids. Filters --data; names --synthetic instruments.
        #[arg(long, value_delimiter = ',')]
        instruments: Vec<String>,

        /// Seed for --synthetic.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Override a config value, e.g. --set thresholds.rsi_buy_ceiling=25
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,

        /// Output directory for report.json, trades.csv and equity.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Load and validate a config, then print the effective configuration.
    CheckConfig {
        #[arg(long)]
        config: PathBuf,

        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
    },
    /// Print the default configuration as TOML.
    Defaults,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json);

    match cli.command {
        Commands::Run {
            config,
            data,
            synthetic,
            instruments,
            seed,
            overrides,
            output_dir,
        } => run_cmd(config, data, synthetic, instruments, seed, overrides, output_dir),
        Commands::CheckConfig { config, overrides } => check_config_cmd(config, overrides),
        Commands::Defaults => {
            print!("{}", RunConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

fn run_cmd(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    synthetic: Option<usize>,
    instruments: Vec<String>,
    seed: u64,
    overrides: Vec<String>,
    output_dir: PathBuf,
) -> Result<()> {
    let config = RunConfig::load(config_path.as_deref(), &overrides)
        .context("configuration rejected")?;
    let timeframe = config.backtest.timeframe_minutes;

    let universe: Vec<InstrumentData> = match (data_dir, synthetic) {
        (Some(dir), None) => {
            let filter = (!instruments.is_empty()).then_some(instruments.as_slice());
            load_dir(&dir, filter, timeframe)
                .with_context(|| format!("failed to load data from {}", dir.display()))?
        }
        (None, Some(count)) => {
            let ids = if instruments.is_empty() {
                vec!["SYN_A".to_string(), "SYN_B".to_string()]
            } else {
                instruments
            };
            let start = Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .context("invalid synthetic start time")?;
            ids.iter()
                .map(|id| generate_synthetic(id, count, start, timeframe, seed))
                .collect()
        }
        _ => bail!("exactly one of --data or --synthetic is required"),
    };

    info!(
        instruments = universe.len(),
        fingerprint = %config.fingerprint()?,
        "starting replay"
    );
    let report = run_replay(&universe, &config.strategy, &config.backtest)?;
    for inst in &report.instruments {
        debug!(instrument = %inst.instrument_id, counts = ?decision_counts(&inst.decisions), "decisions");
    }

    print!("{}", render_summary(&report));
    let report_path = save_artifacts(&report, &output_dir)?;
    println!("Report saved to: {}", report_path.display());

    if report.all_failed() {
        bail!("every instrument failed to replay");
    }
    Ok(())
}

fn check_config_cmd(config_path: PathBuf, overrides: Vec<String>) -> Result<()> {
    let config = RunConfig::load(Some(&config_path), &overrides)
        .with_context(|| format!("{} is invalid", config_path.display()))?;
    print!("{}", config.to_toml_string()?);
    println!("# fingerprint: {}", config.fingerprint()?);
    Ok(())
}
