//! Parallel batch runs over independent series.
//!
//! Each series gets its own freshly built decision source, so policy state
//! never leaks between runs and every run is one atomic unit of work.

use rayon::prelude::*;
use serde::Serialize;

use signalbox_core::PriceSeries;

use crate::runner::RunError;
use crate::source::{DecisionSource, RunResult, RunSettings};

pub fn run_batch<F>(
    series: &[PriceSeries],
    make_source: F,
    settings: &RunSettings,
) -> Vec<Result<RunResult, RunError>>
where
    F: Fn() -> DecisionSource + Sync,
{
    series
        .par_iter()
        .map(|s| {
            let mut source = make_source();
            let result = source.run(s, settings);
            if let Err(err) = &result {
                tracing::warn!(symbol = s.symbol(), error = %err, "batch run failed");
            }
            result
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub mean_return: f64,
    pub best: Option<(String, f64)>,
}

pub fn summarize(results: &[Result<RunResult, RunError>]) -> BatchSummary {
    let ok: Vec<&RunResult> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let mean_return = if ok.is_empty() {
        0.0
    } else {
        ok.iter().map(|r| r.metrics.total_return).sum::<f64>() / ok.len() as f64
    };
    let best = ok
        .iter()
        .max_by(|a, b| a.metrics.total_return.total_cmp(&b.metrics.total_return))
        .map(|r| (r.symbol.clone(), r.metrics.total_return));

    BatchSummary {
        succeeded: ok.len(),
        failed: results.len() - ok.len(),
        mean_return,
        best,
    }
}
