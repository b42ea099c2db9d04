//! Trend following: long while the short moving average leads the long one.
//!
//! Long/flat only: this variant never emits a short position. Rows before
//! `short_window` are forced flat even when both averages are already
//! comparable.

use crate::config::{require_window, ConfigError};
use crate::domain::Signal;
use crate::indicators::{FrameConfig, IndicatorFrame};

use super::SignalGenerator;

/// Dual moving-average trend follower.
///
/// # Indicator dependencies
/// Reads `short_mavg` and `long_mavg`, computed with this generator's
/// `short_window` / `long_window`.
#[derive(Debug, Clone)]
pub struct TrendFollower {
    short_window: usize,
    long_window: usize,
}

impl TrendFollower {
    pub const DEFAULT_SHORT_WINDOW: usize = 40;
    pub const DEFAULT_LONG_WINDOW: usize = 100;

    pub fn new(short_window: usize, long_window: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            short_window: require_window("short_window", short_window)?,
            long_window: require_window("long_window", long_window)?,
        })
    }

    pub fn default_params() -> Self {
        Self {
            short_window: Self::DEFAULT_SHORT_WINDOW,
            long_window: Self::DEFAULT_LONG_WINDOW,
        }
    }

    pub fn short_window(&self) -> usize {
        self.short_window
    }

    pub fn long_window(&self) -> usize {
        self.long_window
    }
}

impl SignalGenerator for TrendFollower {
    fn name(&self) -> &str {
        "trend_following"
    }

    fn frame_config(&self) -> FrameConfig {
        FrameConfig::new(
            FrameConfig::DEFAULT_STAT_WINDOW,
            self.short_window,
            self.long_window,
        )
        .unwrap_or_default()
    }

    fn signals(&self, frame: &IndicatorFrame) -> Vec<Signal> {
        frame
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if i >= self.short_window && row.short_mavg > row.long_mavg {
                    Signal::Long
                } else {
                    Signal::Flat
                }
            })
            .collect()
    }
}
