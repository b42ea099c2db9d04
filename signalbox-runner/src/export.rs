//! Reporting and export: JSON, CSV, and Markdown artifacts.
//!
//! - **JSON**: the full `RunResult` with schema version
//! - **CSV**: signal frame, portfolio trace, and episode steps for external tools
//! - **Markdown**: a short human-readable run report

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use signalbox_core::SignalFrame;

use crate::evaluate::EpisodeReport;
use crate::replay::PortfolioTrace;
use crate::source::{RunOutcome, RunResult};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &RunResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize RunResult to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt_f64(v: f64) -> String {
    if v.is_finite() {
        v.to_string()
    } else {
        String::new()
    }
}

/// Export the signal frame with every indicator column.
///
/// Columns: timestamp, price, volume, mean, std, short_mavg, long_mavg,
/// z_score, signal, position_change, buy_signal, sell_signal. Undefined
/// values (NaN std/z-score, first position change) are empty cells.
pub fn export_signal_frame_csv(frame: &SignalFrame) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "price",
        "volume",
        "mean",
        "std",
        "short_mavg",
        "long_mavg",
        "z_score",
        "signal",
        "position_change",
        "buy_signal",
        "sell_signal",
    ])?;

    for (row, record) in frame.indicators.rows().iter().zip(&frame.records) {
        wtr.write_record([
            record.timestamp.to_rfc3339(),
            record.price.to_string(),
            row.volume.to_string(),
            opt_f64(row.mean),
            opt_f64(row.std),
            opt_f64(row.short_mavg),
            opt_f64(row.long_mavg),
            opt_f64(row.z_score),
            record.signal.value().to_string(),
            record
                .position_change
                .map(|c| c.to_string())
                .unwrap_or_default(),
            record.buy_signal.to_string(),
            record.sell_signal.to_string(),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush signal CSV")?;
    String::from_utf8(bytes).context("signal CSV is not UTF-8")
}

/// Columns: index, value.
pub fn export_trace_csv(trace: &PortfolioTrace) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["index", "value"])?;
    for (i, v) in trace.values.iter().enumerate() {
        wtr.write_record([i.to_string(), v.to_string()])?;
    }
    let bytes = wtr.into_inner().context("failed to flush trace CSV")?;
    String::from_utf8(bytes).context("trace CSV is not UTF-8")
}

/// Columns: step, action, reward, value.
pub fn export_episode_csv(episode: &EpisodeReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["step", "action", "reward", "value"])?;
    for (i, ((action, reward), value)) in episode
        .actions
        .iter()
        .zip(&episode.rewards)
        .zip(&episode.values)
        .enumerate()
    {
        wtr.write_record([
            (i + 1).to_string(),
            format!("{action:?}").to_lowercase(),
            reward.to_string(),
            value.to_string(),
        ])?;
    }
    let bytes = wtr.into_inner().context("failed to flush episode CSV")?;
    String::from_utf8(bytes).context("episode CSV is not UTF-8")
}

// ─── Artifacts ──────────────────────────────────────────────────────

/// Write `result.json`, the CSVs, and `report.md` under
/// `output_dir/<symbol>_<run id prefix>/`. Returns that directory.
pub fn save_artifacts(result: &RunResult, output_dir: &Path) -> Result<PathBuf> {
    let id = result.run_id.as_deref().unwrap_or(&result.dataset_hash);
    let dir = output_dir.join(format!("{}_{}", result.symbol, &id[..id.len().min(12)]));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let write = |name: &str, contents: String| -> Result<()> {
        let path = dir.join(name);
        std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
    };

    write("result.json", export_json(result)?)?;
    match &result.outcome {
        RunOutcome::Rules { signals, trace } => {
            write("signals.csv", export_signal_frame_csv(signals)?)?;
            write("trace.csv", export_trace_csv(trace)?)?;
        }
        RunOutcome::Agent { episode } => {
            write("episode.csv", export_episode_csv(episode)?)?;
        }
    }
    write("report.md", generate_report(result))?;

    tracing::info!(dir = %dir.display(), "artifacts saved");
    Ok(dir)
}

// ─── Markdown ───────────────────────────────────────────────────────

pub fn generate_report(result: &RunResult) -> String {
    let m = &result.metrics;
    let mut out = String::new();

    let _ = writeln!(out, "# {} on {}", result.source, result.symbol);
    let _ = writeln!(out);
    if let Some(id) = &result.run_id {
        let _ = writeln!(out, "Run: `{id}`");
    }
    let _ = writeln!(out, "Dataset: `{}`", result.dataset_hash);
    if result.synthetic {
        let _ = writeln!(out, "Data: synthetic");
    }
    if let Some(digest) = &result.model_digest {
        let _ = writeln!(out, "Model: `{digest}`");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| Initial value | {:.2} |", m.initial_value);
    let _ = writeln!(out, "| Final value | {:.2} |", m.final_value);
    let _ = writeln!(out, "| Total return | {:.2}% |", m.total_return * 100.0);
    let _ = writeln!(out, "| Max drawdown | {:.2}% |", m.max_drawdown * 100.0);
    let _ = writeln!(out, "| Sharpe | {:.2} |", m.sharpe);
    let _ = writeln!(out, "| Trades | {} |", m.trade_count);
    let _ = writeln!(out, "| Rejected | {} |", m.rejected_count);

    match &result.outcome {
        RunOutcome::Rules { signals, .. } => {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "Signals: {} rows, {} long, {} short, {} transitions",
                signals.len(),
                signals.buy_count(),
                signals.sell_count(),
                signals.transition_count()
            );
        }
        RunOutcome::Agent { episode } => {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "Episode: {} steps, done = {}, final reward {:.2}",
                episode.steps,
                episode.done,
                episode.final_reward()
            );
        }
    }
    out
}
