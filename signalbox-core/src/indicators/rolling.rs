//! Rolling mean and sample standard deviation with min-periods 1.
//!
//! Window at index i: `values[max(0, i - w + 1)..=i]`.
//! The mean is defined from the first point on. The standard deviation uses
//! the sample estimator (divide by n - 1) and is NaN for a single-point window.
//! A window of identical values has exactly that value as its mean and a
//! standard deviation of exactly zero, regardless of float rounding.

use super::Indicator;
use crate::config::{require_window, ConfigError};

fn window_bounds(i: usize, window: usize) -> std::ops::RangeInclusive<usize> {
    (i + 1).saturating_sub(window)..=i
}

/// The shared value when every point in the window is equal.
fn constant_value(window: &[f64]) -> Option<f64> {
    let (&first, rest) = window.split_first()?;
    rest.iter().all(|v| *v == first).then_some(first)
}

fn mean_of(window: &[f64]) -> f64 {
    if let Some(value) = constant_value(window) {
        return value;
    }
    window.iter().sum::<f64>() / window.len() as f64
}

/// Trailing arithmetic mean at every index.
///
/// `window` must be >= 1; callers validate through the indicator constructors.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    debug_assert!(window >= 1);
    (0..values.len())
        .map(|i| mean_of(&values[window_bounds(i, window)]))
        .collect()
}

/// Trailing sample standard deviation at every index (NaN while only one point is available).
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    debug_assert!(window >= 1);
    (0..values.len())
        .map(|i| {
            let w = &values[window_bounds(i, window)];
            if w.len() < 2 {
                return f64::NAN;
            }
            if constant_value(w).is_some() {
                return 0.0;
            }
            let mean = mean_of(w);
            let ss: f64 = w.iter().map(|v| (v - mean) * (v - mean)).sum();
            (ss / (w.len() - 1) as f64).sqrt()
        })
        .collect()
}

/// Normalized deviation `(value - mean) / std`.
///
/// Undefined (NaN) when the deviation is not finite: a NaN or zero-variance
/// window never produces an infinite score.
pub fn z_score(value: f64, mean: f64, std: f64) -> f64 {
    if !std.is_finite() || std == 0.0 {
        return f64::NAN;
    }
    (value - mean) / std
}

#[derive(Debug, Clone)]
pub struct RollingMean {
    window: usize,
    name: String,
}

impl RollingMean {
    pub fn new(window: usize) -> Result<Self, ConfigError> {
        let window = require_window("window", window)?;
        Ok(Self {
            window,
            name: format!("mean_{window}"),
        })
    }
}

impl Indicator for RollingMean {
    fn name(&self) -> &str {
        &self.name
    }

    fn window(&self) -> usize {
        self.window
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        rolling_mean(values, self.window)
    }
}

#[derive(Debug, Clone)]
pub struct RollingStd {
    window: usize,
    name: String,
}

impl RollingStd {
    pub fn new(window: usize) -> Result<Self, ConfigError> {
        let window = require_window("window", window)?;
        Ok(Self {
            window,
            name: format!("std_{window}"),
        })
    }
}

impl Indicator for RollingStd {
    fn name(&self) -> &str {
        &self.name
    }

    fn window(&self) -> usize {
        self.window
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        rolling_std(values, self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn mean_warmup_uses_available_history() {
        let result = rolling_mean(&[10.0, 20.0, 30.0, 40.0], 3);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 15.0, DEFAULT_EPSILON);
        assert_approx(result[2], 20.0, DEFAULT_EPSILON);
        // Full window from here on: mean(20, 30, 40)
        assert_approx(result[3], 30.0, DEFAULT_EPSILON);
    }

    #[test]
    fn mean_window_one_is_identity() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(rolling_mean(&values, 1), values.to_vec());
    }

    #[test]
    fn std_single_point_is_nan() {
        let result = rolling_std(&[10.0, 12.0, 14.0], 3);
        assert!(result[0].is_nan());
        // sample std of (10, 12) = sqrt(2)
        assert_approx(result[1], 2.0_f64.sqrt(), DEFAULT_EPSILON);
        // sample std of (10, 12, 14) = 2
        assert_approx(result[2], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn std_window_one_is_always_nan() {
        assert!(rolling_std(&[1.0, 2.0, 3.0], 1).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn std_constant_window_is_zero() {
        let result = rolling_std(&[5.0, 5.0, 5.0], 3);
        assert_eq!(result[2], 0.0);
    }

    #[test]
    fn inexact_constant_window_is_exact() {
        // 100.1 has no exact binary form; summing it drifts by a few ulps.
        let values = vec![100.1; 30];
        let means = rolling_mean(&values, 5);
        let stds = rolling_std(&values, 5);
        assert!(means.iter().all(|m| *m == 100.1));
        assert!(stds[0].is_nan());
        assert!(stds[1..].iter().all(|s| *s == 0.0));
        assert!(z_score(values[2], means[2], stds[2]).is_nan());
    }

    #[test]
    fn empty_input_empty_output() {
        assert!(rolling_mean(&[], 5).is_empty());
        assert!(rolling_std(&[], 5).is_empty());
    }

    #[test]
    fn z_score_degenerate_cases() {
        assert!(z_score(1.0, 1.0, 0.0).is_nan());
        assert!(z_score(2.0, 1.0, f64::NAN).is_nan());
        assert_approx(z_score(12.0, 10.0, 2.0), 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn constructors_reject_zero_window() {
        assert!(RollingMean::new(0).is_err());
        assert!(RollingStd::new(0).is_err());
        assert_eq!(RollingMean::new(20).unwrap().name(), "mean_20");
        assert_eq!(RollingStd::new(20).unwrap().window(), 20);
    }
}
