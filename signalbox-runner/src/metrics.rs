//! Performance metrics: pure functions over a portfolio value trace.
//!
//! Every metric is a pure function: value trace in, scalar out. No
//! dependencies on the replay loop, environment, or data layer.

use serde::{Deserialize, Serialize};

/// Aggregate performance metrics for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_value: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub trade_count: usize,
    pub rejected_count: usize,
}

impl PerformanceMetrics {
    /// Compute all metrics from a value trace that started at `initial_value`.
    pub fn compute(
        values: &[f64],
        initial_value: f64,
        trade_count: usize,
        rejected_count: usize,
    ) -> Self {
        let final_value = values.last().copied().unwrap_or(initial_value);
        Self {
            initial_value,
            final_value,
            total_return: total_return(initial_value, final_value),
            max_drawdown: max_drawdown(values),
            sharpe: sharpe_ratio(values),
            trade_count,
            rejected_count,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(initial: f64, final_value: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_value - initial) / initial
}

/// Maximum peak-to-trough decline as a negative fraction (0.0 if none).
pub fn max_drawdown(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let dd = (v - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Annualized Sharpe ratio of per-row returns, zero risk-free rate.
///
/// Assumes 252 rows per year. Returns 0.0 with fewer than two returns or
/// zero variance.
pub fn sharpe_ratio(values: &[f64]) -> f64 {
    let returns = period_returns(values);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(&returns);
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * (252.0_f64).sqrt()
}

/// Simple returns between consecutive values.
pub fn period_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

fn mean_f64(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation.
fn std_dev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean_f64(xs);
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    var.sqrt()
}
