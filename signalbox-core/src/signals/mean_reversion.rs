//! Mean reversion: fade z-score extremes around a rolling mean.
//!
//! z > threshold (over-extended high) → short; z < -threshold → long.
//! The "> threshold" branch is evaluated first and the "< -threshold" branch
//! overrides it when it fires. An undefined z-score (single-point or
//! zero-variance window) is always flat.
//!
//! A threshold <= 0 is accepted: it makes the strategy signal on almost every
//! row, which is the caller's responsibility.

use crate::config::{require_window, ConfigError};
use crate::domain::Signal;
use crate::indicators::{FrameConfig, IndicatorFrame};

use super::SignalGenerator;

#[derive(Debug, Clone)]
pub struct MeanReversion {
    window: usize,
    threshold: f64,
}

impl MeanReversion {
    pub const DEFAULT_WINDOW: usize = 20;
    pub const DEFAULT_THRESHOLD: f64 = 1.5;

    pub fn new(window: usize, threshold: f64) -> Result<Self, ConfigError> {
        if !threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        Ok(Self {
            window: require_window("window", window)?,
            threshold,
        })
    }

    pub fn default_params() -> Self {
        Self {
            window: Self::DEFAULT_WINDOW,
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn classify(&self, z: f64) -> Signal {
        if z.is_nan() {
            return Signal::Flat;
        }
        let mut signal = Signal::Flat;
        if z > self.threshold {
            signal = Signal::Short;
        }
        if z < -self.threshold {
            signal = Signal::Long;
        }
        signal
    }
}

impl SignalGenerator for MeanReversion {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn frame_config(&self) -> FrameConfig {
        FrameConfig::new(
            self.window,
            FrameConfig::DEFAULT_SHORT_WINDOW,
            FrameConfig::DEFAULT_LONG_WINDOW,
        )
        .unwrap_or_default()
    }

    fn signals(&self, frame: &IndicatorFrame) -> Vec<Signal> {
        frame.rows().iter().map(|row| self.classify(row.z_score)).collect()
    }
}
