//! Rolling indicator engine.
//!
//! Every indicator is a pure function of a price slice and is causal: the
//! value at index `i` depends only on `values[..=i]`. The warm-up policy is
//! min-periods 1: while fewer than `window` points exist, statistics are
//! computed over whatever history is available instead of being suppressed.

pub mod frame;
pub mod rolling;

pub use frame::{FrameConfig, IndicatorFrame, IndicatorRow};
pub use rolling::{rolling_mean, rolling_std, z_score, RollingMean, RollingStd};

/// Trait for rolling indicators.
///
/// Indicators take a full value series and produce an output series of the
/// same length.
///
/// # Look-ahead contamination guard
/// No output at index t may depend on input at t+1 or later. Every indicator
/// must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "mean_20", "std_20").
    fn name(&self) -> &str;

    /// Trailing window length.
    fn window(&self) -> usize;

    /// Compute the indicator over the entire series.
    fn compute(&self, values: &[f64]) -> Vec<f64>;
}

/// Build a price series from bare prices for testing.
///
/// One point per day starting 2024-01-02, volume 1000.
#[cfg(test)]
pub fn make_series(prices: &[f64]) -> crate::domain::PriceSeries {
    use crate::domain::{PricePoint, PriceSeries};
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let points = prices
        .iter()
        .enumerate()
        .map(|(i, &price)| PricePoint::new(base + chrono::Duration::days(i as i64), price, 1000.0))
        .collect();
    PriceSeries::new("TEST", points).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
