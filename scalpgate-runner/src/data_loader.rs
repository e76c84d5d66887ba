//! Candle loading for the runner.
//!
//! Two sources:
//! 1. CSV files, one per instrument, named after the instrument
//!    (`BTC_USDT.csv` loads instrument `BTC_USDT`)
//! 2. A seeded synthetic market for offline runs and tests
//!
//! CSV header: `timestamp,open,high,low,close,volume[,model_class_verdict,model_confidence]`.
//! `timestamp` is the candle open time, RFC 3339 or integer milliseconds.
//! Model columns are optional; rows without them get no prediction.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use scalpgate_core::components::PrecomputedPredictions;
use scalpgate_core::domain::{Candle, ModelOutput, ModelVerdict};
use scalpgate_core::indicators::{compute_indicators, IndicatorSettings};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed CSV in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("{path} line {line}: unparseable timestamp '{value}'")]
    BadTimestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },
    #[error("{path} line {line}: model_class_verdict must be 0 or 1, got {value}")]
    BadVerdict { path: PathBuf, line: u64, value: u8 },
    #[error("{path} line {line}: candle at {got} does not follow {previous}")]
    NotTimeOrdered {
        path: PathBuf,
        line: u64,
        previous: DateTime<Utc>,
        got: DateTime<Utc>,
    },
    #[error("no CSV files in {0}")]
    NoData(PathBuf),
    #[error("instrument '{0}' not found in data directory")]
    UnknownInstrument(String),
}

/// Candles and model outputs for one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentData {
    pub instrument_id: String,
    pub candles: Vec<Candle>,
    pub predictions: PrecomputedPredictions,
    /// Generated rather than loaded.
    pub synthetic: bool,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    model_class_verdict: Option<u8>,
    #[serde(default)]
    model_confidence: Option<f64>,
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Load one CSV file. Rows must be strictly increasing in time. Candles that
/// fail the OHLC sanity check are skipped with a warning.
pub fn load_csv(path: &Path, timeframe_minutes: u32) -> Result<InstrumentData, LoadError> {
    let instrument_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let timeframe = Duration::minutes(i64::from(timeframe_minutes));
    let mut candles: Vec<Candle> = Vec::new();
    let mut predictions = PrecomputedPredictions::new();
    let mut skipped = 0usize;

    for record in reader.deserialize::<CsvRow>() {
        let row = record.map_err(csv_err)?;
        // header is line 1
        let line = candles.len() as u64 + skipped as u64 + 2;
        let open_time = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::BadTimestamp {
            path: path.to_path_buf(),
            line,
            value: row.timestamp.clone(),
        })?;

        if let Some(previous) = candles.last().map(|c| c.open_time) {
            if open_time <= previous {
                return Err(LoadError::NotTimeOrdered {
                    path: path.to_path_buf(),
                    line,
                    previous,
                    got: open_time,
                });
            }
        }

        let candle = Candle {
            instrument_id: instrument_id.clone(),
            open_time,
            close_time: open_time + timeframe,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        };
        if !candle.is_sane() {
            warn!(instrument = %instrument_id, line, "skipping malformed candle");
            skipped += 1;
            continue;
        }

        if let Some(raw) = row.model_class_verdict {
            let verdict = ModelVerdict::try_from(raw).map_err(|_| LoadError::BadVerdict {
                path: path.to_path_buf(),
                line,
                value: raw,
            })?;
            let confidence = row.model_confidence.unwrap_or(f64::NAN);
            predictions.insert(candle.close_time, ModelOutput::new(verdict, confidence));
        }
        candles.push(candle);
    }

    debug!(
        instrument = %instrument_id,
        candles = candles.len(),
        predictions = predictions.len(),
        skipped,
        "loaded csv"
    );
    Ok(InstrumentData {
        instrument_id,
        candles,
        predictions,
        synthetic: false,
    })
}

/// Load every `*.csv` in `dir`, or only the named instruments. Results are
/// sorted by instrument id.
pub fn load_dir(
    dir: &Path,
    instruments: Option<&[String]>,
    timeframe_minutes: u32,
) -> Result<Vec<InstrumentData>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
            paths.push(path);
        }
    }
    paths.sort();

    if let Some(wanted) = instruments {
        for id in wanted {
            let found = paths
                .iter()
                .any(|p| p.file_stem().is_some_and(|s| s.to_string_lossy() == id.as_str()));
            if !found {
                return Err(LoadError::UnknownInstrument(id.clone()));
            }
        }
        paths.retain(|p| {
            p.file_stem()
                .is_some_and(|s| wanted.iter().any(|id| s.to_string_lossy() == id.as_str()))
        });
    }
    if paths.is_empty() {
        return Err(LoadError::NoData(dir.to_path_buf()));
    }

    paths
        .iter()
        .map(|path| load_csv(path, timeframe_minutes))
        .collect()
}

/// Candles in one synthetic market cycle: a random walk, then a sell-off.
const CYCLE_LEN: usize = 150;
/// Length of the steady sell-off that closes each cycle.
const SELLOFF_LEN: usize = 45;
/// Per-candle decline during a sell-off, as a `(min, max)` fraction.
const SELLOFF_STEP: (f64, f64) = (0.0027, 0.0033);
/// Return of the rebound candle that ends a sell-off.
const REBOUND_RETURN: f64 = 0.014;

/// Generate a synthetic market with pseudo-model outputs.
///
/// Deterministic in `(instrument_id, seed)`. Each cycle wanders for a while,
/// then sells off steadily and rebounds in one sharp candle, so oversold
/// bounces show up at a known cadence. The pseudo-model labels a candle
/// favorable when it closes above the fast EMA while RSI is still depressed.
/// It only reads indicators, which depend on candles up to the one labelled.
pub fn generate_synthetic(
    instrument_id: &str,
    candle_count: usize,
    start: DateTime<Utc>,
    timeframe_minutes: u32,
    seed: u64,
) -> InstrumentData {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(instrument_id.as_bytes());
    let mut rng = StdRng::from_seed(*hasher.finalize().as_bytes());

    let timeframe = Duration::minutes(i64::from(timeframe_minutes));
    let mut candles = Vec::with_capacity(candle_count);
    let mut price = 100.0_f64;
    let mut drift = 0.0_f64;
    let selloff_start = CYCLE_LEN - SELLOFF_LEN - 1;

    for i in 0..candle_count {
        let phase = i % CYCLE_LEN;
        let (ret, volume) = if phase == CYCLE_LEN - 1 {
            (REBOUND_RETURN, rng.gen_range(2_500.0..3_500.0))
        } else if phase >= selloff_start {
            (-rng.gen_range(SELLOFF_STEP.0..SELLOFF_STEP.1), rng.gen_range(800.0..1_200.0))
        } else {
            // slowly wandering drift produces alternating trends and pullbacks
            drift = (drift + rng.gen_range(-0.0004..0.0004)).clamp(-0.002, 0.002);
            let spike = if rng.gen_bool(0.1) { 2.5 } else { 1.0 };
            (drift + rng.gen_range(-0.004..0.004), rng.gen_range(500.0..1_500.0) * spike)
        };

        let open = price;
        let close = (price * (1.0 + ret)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.002));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.002));
        let open_time = start + timeframe * i as i32;
        candles.push(Candle {
            instrument_id: instrument_id.to_string(),
            open_time,
            close_time: open_time + timeframe,
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
    }

    let rows = compute_indicators(&candles, &IndicatorSettings::default());
    let predictions = candles
        .iter()
        .zip(&rows)
        .map(|(candle, row)| {
            // NaN warm-up values compare false and label the candle unfavorable
            let bounce = candle.close > row.ema_fast && row.rsi < PSEUDO_MODEL_RSI_CEILING;
            let output = if bounce {
                ModelOutput::new(ModelVerdict::Favorable, rng.gen_range(0.7..0.95))
            } else {
                ModelOutput::new(ModelVerdict::Unfavorable, rng.gen_range(0.5..0.95))
            };
            (candle.close_time, output)
        })
        .collect();

    InstrumentData {
        instrument_id: instrument_id.to_string(),
        candles,
        predictions,
        synthetic: true,
    }
}

/// RSI below which the pseudo-model still calls a bounce above the fast EMA favorable.
const PSEUDO_MODEL_RSI_CEILING: f64 = 40.0;
