use chrono::{TimeZone, Utc};
use scalpgate_core::engine::StrategyConfig;
use scalpgate_runner::{
    generate_synthetic, load_report, run_replay, save_artifacts, BacktestSettings,
};

#[test]
fn artifacts_written_and_reloaded() {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let data = [generate_synthetic("SYN", 1_000, start, 5, 99)];
    let report =
        run_replay(&data, &StrategyConfig::default(), &BacktestSettings::default()).unwrap();
    assert!(report.totals.trade_count > 0, "synthetic market should trade");

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("run");
    let report_path = save_artifacts(&report, &out).unwrap();

    assert!(report_path.ends_with("report.json"));
    assert!(out.join("trades.csv").exists());
    assert!(out.join("equity.csv").exists());

    let trades_csv = std::fs::read_to_string(out.join("trades.csv")).unwrap();
    assert_eq!(trades_csv.lines().count(), report.totals.trade_count + 1);

    let reloaded = load_report(&report_path).unwrap();
    assert_eq!(reloaded.schema_version, 1);
    assert_eq!(reloaded.instruments[0].decision_digest, report.instruments[0].decision_digest);
    assert_eq!(reloaded.backtest, report.backtest);
}
