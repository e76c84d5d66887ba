//! Replay artifacts: `report.json`, `trades.csv`, `equity.csv`, plus a plain
//! text summary for the terminal.
//!
//! `report.json` carries `schema_version`; newer versions are rejected on load.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use scalpgate_core::domain::TradeRecord;

use crate::metrics::equity_curve;
use crate::runner::{ReplayReport, SCHEMA_VERSION};

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(report: &ReplayReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ReplayReport to JSON")
}

/// Deserialize a `ReplayReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ReplayReport> {
    let report: ReplayReport =
        serde_json::from_str(json).context("failed to deserialize ReplayReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Trade tape, one row per closed trade.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "instrument_id",
        "entry_tag",
        "open_time",
        "open_rate",
        "stake",
        "close_time",
        "close_rate",
        "exit_reason",
        "hold_minutes",
        "fee_paid",
        "profit_abs",
        "profit_ratio",
    ])?;

    for t in trades {
        wtr.write_record([
            t.instrument_id.as_str(),
            t.entry_tag.as_deref().unwrap_or(""),
            &t.open_time.to_rfc3339(),
            &format!("{:.8}", t.open_rate),
            &format!("{:.4}", t.stake),
            &t.close_time.to_rfc3339(),
            &format!("{:.8}", t.close_rate),
            t.exit_reason.as_str(),
            &format!("{:.1}", t.hold_minutes()),
            &format!("{:.6}", t.fee_paid),
            &format!("{:.6}", t.profit_abs),
            &format!("{:.6}", t.profit_ratio()),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Realised equity after each trade close.
pub fn export_equity_csv(curve: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["trade_index", "equity"])?;
    for (i, eq) in curve.iter().enumerate() {
        wtr.write_record([&i.to_string(), &format!("{:.4}", eq)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `report.json`, `trades.csv` and `equity.csv` into `output_dir`,
/// creating it if needed. Returns the path of `report.json`.
pub fn save_artifacts(report: &ReplayReport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let report_path = output_dir.join("report.json");
    std::fs::write(&report_path, export_json(report)?)
        .with_context(|| format!("failed to write {}", report_path.display()))?;

    let trades = report.all_trades();
    std::fs::write(output_dir.join("trades.csv"), export_trades_csv(&trades)?)
        .context("failed to write trades.csv")?;

    let curve = equity_curve(&trades, report.backtest.initial_capital);
    std::fs::write(output_dir.join("equity.csv"), export_equity_csv(&curve)?)
        .context("failed to write equity.csv")?;

    Ok(report_path)
}

pub fn load_report(path: &Path) -> Result<ReplayReport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Terminal summary ───────────────────────────────────────────────

pub fn render_summary(report: &ReplayReport) -> String {
    let mut out = String::with_capacity(1024);
    let _ = writeln!(
        out,
        "{:<16} {:>8} {:>7} {:>9} {:>12} {:>9}",
        "instrument", "candles", "trades", "win rate", "profit", "max dd"
    );
    for r in &report.instruments {
        let m = &r.metrics;
        let _ = writeln!(
            out,
            "{:<16} {:>8} {:>7} {:>8.1}% {:>12.4} {:>8.2}%{}",
            r.instrument_id,
            r.candle_count,
            m.trade_count,
            m.win_rate * 100.0,
            m.total_profit_abs,
            m.max_drawdown * 100.0,
            if r.synthetic { "  (synthetic)" } else { "" }
        );
    }
    let t = &report.totals;
    let _ = writeln!(
        out,
        "{:<16} {:>8} {:>7} {:>8.1}% {:>12.4} {:>8.2}%",
        "TOTAL",
        "",
        t.trade_count,
        t.win_rate * 100.0,
        t.total_profit_abs,
        t.max_drawdown * 100.0
    );
    if !t.exit_reason_counts.is_empty() {
        let reasons: Vec<String> = t
            .exit_reason_counts
            .iter()
            .map(|(reason, n)| format!("{reason}={n}"))
            .collect();
        let _ = writeln!(out, "exits: {}", reasons.join(", "));
    }
    for f in &report.failures {
        let _ = writeln!(out, "FAILED {}: {}", f.instrument_id, f.error);
    }
    out
}
