//! Signal generation: turns an indicator frame into discrete positions.
//!
//! Generators are account-agnostic: they see the indicator frame and nothing
//! else. Each rule-based strategy is one variant of [`Strategy`], so the
//! replay and reporting layers never need to know which one produced a frame.

pub mod mean_reversion;
pub mod trend_follower;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::domain::{PriceSeries, Signal, SignalRecord};
use crate::indicators::{FrameConfig, IndicatorFrame};

pub use mean_reversion::MeanReversion;
pub use trend_follower::TrendFollower;

/// Trait for signal generators.
///
/// # Architecture invariant
/// `signals` must only read `frame`; the value at row i may only use rows
/// `..=i`. The frame is expected to be computed with [`frame_config`], which
/// [`run`] takes care of.
///
/// [`frame_config`]: SignalGenerator::frame_config
/// [`run`]: SignalGenerator::run
pub trait SignalGenerator: Send + Sync {
    /// Human-readable name (e.g., "trend_following").
    fn name(&self) -> &str;

    /// Window configuration this generator's indicator columns need.
    fn frame_config(&self) -> FrameConfig;

    /// One signal per frame row.
    fn signals(&self, frame: &IndicatorFrame) -> Vec<Signal>;

    /// Full signal frame: signals, position changes and buy/sell flags.
    fn generate_signals(&self, frame: &IndicatorFrame) -> SignalFrame {
        let signals = self.signals(frame);
        let changes = position_changes(&signals);
        let records = frame
            .rows()
            .iter()
            .zip(signals)
            .zip(changes)
            .map(|((row, signal), change)| {
                SignalRecord::new(row.timestamp, row.price, signal, change)
            })
            .collect();
        SignalFrame {
            strategy: self.name().to_string(),
            indicators: frame.clone(),
            records,
        }
    }

    /// Compute the indicator frame for `series` and generate signals over it.
    fn run(&self, series: &PriceSeries) -> SignalFrame {
        let frame = IndicatorFrame::compute(series, self.frame_config());
        self.generate_signals(&frame)
    }
}

/// First difference of a signal column; `None` at row 0.
pub fn position_changes(signals: &[Signal]) -> Vec<Option<i8>> {
    if signals.is_empty() {
        return Vec::new();
    }
    std::iter::once(None)
        .chain(
            signals
                .windows(2)
                .map(|pair| Some(pair[1].value() - pair[0].value())),
        )
        .collect()
}

/// Signal frame handed to reporting: indicators plus one record per row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalFrame {
    pub strategy: String,
    pub indicators: IndicatorFrame,
    pub records: Vec<SignalRecord>,
}

impl SignalFrame {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.records.iter().map(|r| r.signal).collect()
    }

    pub fn buy_count(&self) -> usize {
        self.records.iter().filter(|r| r.buy_signal).count()
    }

    pub fn sell_count(&self) -> usize {
        self.records.iter().filter(|r| r.sell_signal).count()
    }

    /// Number of rows where the signal changed.
    pub fn transition_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.position_change.is_some_and(|c| c != 0))
            .count()
    }
}

/// Serializable strategy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Long while the short moving average is above the long one.
    TrendFollowing {
        #[serde(default = "default_short_window")]
        short_window: usize,
        #[serde(default = "default_long_window")]
        long_window: usize,
    },

    /// Fade z-score extremes of price around its rolling mean.
    MeanReversion {
        #[serde(default = "default_stat_window")]
        window: usize,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
}

fn default_short_window() -> usize {
    TrendFollower::DEFAULT_SHORT_WINDOW
}

fn default_long_window() -> usize {
    TrendFollower::DEFAULT_LONG_WINDOW
}

fn default_stat_window() -> usize {
    MeanReversion::DEFAULT_WINDOW
}

fn default_threshold() -> f64 {
    MeanReversion::DEFAULT_THRESHOLD
}

/// Rule-based signal source, one variant per strategy.
#[derive(Debug, Clone)]
pub enum Strategy {
    TrendFollowing(TrendFollower),
    MeanReversion(MeanReversion),
}

impl Strategy {
    pub fn from_config(config: &StrategyConfig) -> Result<Self, ConfigError> {
        Ok(match *config {
            StrategyConfig::TrendFollowing {
                short_window,
                long_window,
            } => Strategy::TrendFollowing(TrendFollower::new(short_window, long_window)?),
            StrategyConfig::MeanReversion { window, threshold } => {
                Strategy::MeanReversion(MeanReversion::new(window, threshold)?)
            }
        })
    }

    fn inner(&self) -> &dyn SignalGenerator {
        match self {
            Strategy::TrendFollowing(s) => s,
            Strategy::MeanReversion(s) => s,
        }
    }
}

impl From<TrendFollower> for Strategy {
    fn from(s: TrendFollower) -> Self {
        Strategy::TrendFollowing(s)
    }
}

impl From<MeanReversion> for Strategy {
    fn from(s: MeanReversion) -> Self {
        Strategy::MeanReversion(s)
    }
}

impl SignalGenerator for Strategy {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn frame_config(&self) -> FrameConfig {
        self.inner().frame_config()
    }

    fn signals(&self, frame: &IndicatorFrame) -> Vec<Signal> {
        self.inner().signals(frame)
    }
}
