//! Indicator frame: the price series aligned with every derived column.
//!
//! `IndicatorFrame[i]` is derived only from `PriceSeries[..=i]`. The frame is
//! computed once per run and shared read-only by signal generators and the
//! decision environment.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::rolling::{rolling_mean, rolling_std, z_score};
use crate::config::{require_window, ConfigError};
use crate::domain::PriceSeries;

/// Window lengths for the frame's derived columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameConfig {
    stat_window: usize,
    short_window: usize,
    long_window: usize,
}

impl FrameConfig {
    pub const DEFAULT_STAT_WINDOW: usize = 20;
    pub const DEFAULT_SHORT_WINDOW: usize = 40;
    pub const DEFAULT_LONG_WINDOW: usize = 100;

    pub fn new(
        stat_window: usize,
        short_window: usize,
        long_window: usize,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            stat_window: require_window("stat_window", stat_window)?,
            short_window: require_window("short_window", short_window)?,
            long_window: require_window("long_window", long_window)?,
        })
    }

    /// Window for the rolling mean / std / z-score columns.
    pub fn stat_window(&self) -> usize {
        self.stat_window
    }

    pub fn short_window(&self) -> usize {
        self.short_window
    }

    pub fn long_window(&self) -> usize {
        self.long_window
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            stat_window: Self::DEFAULT_STAT_WINDOW,
            short_window: Self::DEFAULT_SHORT_WINDOW,
            long_window: Self::DEFAULT_LONG_WINDOW,
        }
    }
}

/// One aligned row: the raw observation plus every derived field.
///
/// `std` is NaN while only one point is in the window; `z_score` is NaN
/// whenever `std` is NaN or zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
    pub mean: f64,
    pub std: f64,
    pub short_mavg: f64,
    pub long_mavg: f64,
    pub z_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    symbol: String,
    config: FrameConfig,
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    /// Compute all columns for `series`. An empty series yields an empty frame.
    pub fn compute(series: &PriceSeries, config: FrameConfig) -> Self {
        let prices = series.prices();
        let mean = rolling_mean(&prices, config.stat_window);
        let std = rolling_std(&prices, config.stat_window);
        // The two moving averages are independent of each other.
        let short = rolling_mean(&prices, config.short_window);
        let long = rolling_mean(&prices, config.long_window);

        let rows = series
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| IndicatorRow {
                timestamp: p.timestamp,
                price: p.price,
                volume: p.volume,
                mean: mean[i],
                std: std[i],
                short_mavg: short[i],
                long_mavg: long[i],
                z_score: z_score(p.price, mean[i], std[i]),
            })
            .collect();

        Self {
            symbol: series.symbol().to_string(),
            config,
            rows,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> FrameConfig {
        self.config
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&IndicatorRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.price).collect()
    }
}
