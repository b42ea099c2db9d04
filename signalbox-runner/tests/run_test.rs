//! End-to-end runs through the public runner API.

use signalbox_core::data::{synthetic_series, write_series_csv};
use signalbox_runner::{
    export, run_batch, run_from_config, summarize, DecisionSource, RunConfig, RunOutcome,
};

const MEAN_REVERSION_RUN: &str = r#"
[data]
source = "synthetic"
symbol = "E2E"
length = 250
seed = 11

[strategy]
type = "mean_reversion"
window = 20
threshold = 1.0

[account]
initial_capital = 10000.0
fee_rate = 0.001
trade_quantity = 5.0
"#;

#[test]
fn mean_reversion_run_is_reproducible() {
    let config = RunConfig::from_toml_str(MEAN_REVERSION_RUN).unwrap();
    let a = run_from_config(&config).unwrap();
    let b = run_from_config(&config).unwrap();

    assert_eq!(a.metrics, b.metrics);
    assert_eq!(a.dataset_hash, b.dataset_hash);
    assert_eq!(a.run_id, b.run_id);

    let RunOutcome::Rules { signals, trace } = &a.outcome else {
        panic!("expected rules outcome");
    };
    assert_eq!(trace.values.len(), signals.len());
    assert_eq!(a.metrics.trade_count, trace.trades.len());
    assert_eq!(a.metrics.rejected_count, trace.rejected.len());
    // The guarded account never goes short.
    assert!(trace.final_position >= 0.0);
    assert!(trace.final_capital >= 0.0);
}

#[test]
fn csv_config_runs_against_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prices.csv");
    write_series_csv(&path, &synthetic_series("FILE", 120, 4)).unwrap();

    let text = format!(
        "[data]\nsource = \"csv\"\npath = {:?}\nsymbol = \"FILE\"\n\n[strategy]\ntype = \"trend_following\"\nshort_window = 5\nlong_window = 20\n",
        path.display().to_string()
    );
    let config = RunConfig::from_toml_str(&text).unwrap();
    let result = run_from_config(&config).unwrap();
    assert_eq!(result.symbol, "FILE");
    assert!(!result.synthetic);
    assert_eq!(result.values().len(), 120);

    let out = export::save_artifacts(&result, dir.path()).unwrap();
    let json = std::fs::read_to_string(out.join("result.json")).unwrap();
    assert!(json.contains("\"mode\": \"rules\""));
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.toml");
    std::fs::write(&path, MEAN_REVERSION_RUN).unwrap();

    let loaded = RunConfig::load(&path).unwrap();
    assert_eq!(loaded, RunConfig::from_toml_str(MEAN_REVERSION_RUN).unwrap());
}

#[test]
fn batch_over_universe() {
    let config = RunConfig::from_toml_str(MEAN_REVERSION_RUN).unwrap();
    let universe: Vec<_> = (0..6)
        .map(|i| synthetic_series(&format!("S{i}"), 150, i))
        .collect();

    let results = run_batch(
        &universe,
        || config.decision_source().unwrap(),
        &config.settings(),
    );
    let summary = summarize(&results);
    assert_eq!(summary.succeeded, 6);
    assert_eq!(summary.failed, 0);
    assert!(summary.best.is_some());

    let source: DecisionSource = config.decision_source().unwrap();
    assert_eq!(source.name(), "mean_reversion");
}
