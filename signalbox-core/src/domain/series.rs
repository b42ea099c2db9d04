//! Price series: the time-indexed input to the indicator engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One observation of price and traded volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64, volume: f64) -> Self {
        Self {
            timestamp,
            price,
            volume,
        }
    }
}

/// Ordering violations detected while building a series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("timestamp at index {index} ({timestamp}) is earlier than its predecessor")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("duplicate timestamp at index {index} ({timestamp})")]
    DuplicateTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Chronologically ordered price/volume series for one symbol.
///
/// Immutable once built. Timestamps are strictly increasing; the constructor
/// is the only way in, so every `PriceSeries` in the system satisfies that.
/// Numeric hygiene (NaN, infinities) is the data layer's job, see
/// [`crate::data::sanitize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        for (index, pair) in points.windows(2).enumerate() {
            let (prev, cur) = (pair[0].timestamp, pair[1].timestamp);
            if cur == prev {
                return Err(SeriesError::DuplicateTimestamp {
                    index: index + 1,
                    timestamp: cur,
                });
            }
            if cur < prev {
                return Err(SeriesError::OutOfOrder {
                    index: index + 1,
                    timestamp: cur,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    /// An empty series, the shape an upstream fetch failure degrades to.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PricePoint> {
        self.points.get(index)
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.volume).collect()
    }

    /// The first `len` points as a new series (prefix view used by causality checks).
    pub fn truncated(&self, len: usize) -> Self {
        Self {
            symbol: self.symbol.clone(),
            points: self.points[..len.min(self.points.len())].to_vec(),
        }
    }

    pub fn into_points(self) -> Vec<PricePoint> {
        self.points
    }
}
