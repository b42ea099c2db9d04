//! Data loading for runs: picks a provider from the config and returns a
//! sanitized series plus a fingerprint of the data it produced.
//!
//! Remote fetch failures never abort a run; they degrade to an empty series
//! with the error logged. Local CSV errors are surfaced to the caller.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use signalbox_core::data::{
    fetch_or_empty, read_series_csv, synthetic_series, CoinGeckoProvider, DataError,
    PriceProvider, YahooProvider,
};
use signalbox_core::PriceSeries;

pub const DEFAULT_SYNTHETIC_LENGTH: usize = 500;
pub const DEFAULT_DAYS: u32 = 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DataConfig {
    Synthetic {
        symbol: String,
        #[serde(default = "default_length")]
        length: usize,
        #[serde(default)]
        seed: u64,
    },
    Csv {
        path: PathBuf,
        symbol: String,
    },
    Coingecko {
        /// CoinGecko coin id, e.g. `bitcoin`.
        symbol: String,
        #[serde(default = "default_days")]
        days: u32,
    },
    Yahoo {
        symbol: String,
        #[serde(default = "default_days")]
        days: u32,
    },
}

fn default_length() -> usize {
    DEFAULT_SYNTHETIC_LENGTH
}

fn default_days() -> u32 {
    DEFAULT_DAYS
}

impl DataConfig {
    pub fn symbol(&self) -> &str {
        match self {
            DataConfig::Synthetic { symbol, .. }
            | DataConfig::Csv { symbol, .. }
            | DataConfig::Coingecko { symbol, .. }
            | DataConfig::Yahoo { symbol, .. } => symbol,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataConfig::Synthetic { .. })
    }
}

/// Load the series a config points at.
pub fn load_series(config: &DataConfig) -> Result<PriceSeries, DataError> {
    let series = match config {
        DataConfig::Synthetic {
            symbol,
            length,
            seed,
        } => synthetic_series(symbol, *length, *seed),
        DataConfig::Csv { path, symbol } => read_series_csv(path, symbol)?,
        DataConfig::Coingecko { symbol, days } => {
            let provider = CoinGeckoProvider::new()?;
            fetch_remote(&provider, symbol, *days)
        }
        DataConfig::Yahoo { symbol, days } => {
            let provider = YahooProvider::new()?;
            fetch_remote(&provider, symbol, *days)
        }
    };
    tracing::info!(symbol = config.symbol(), points = series.len(), "series loaded");
    Ok(series)
}

fn fetch_remote(provider: &dyn PriceProvider, symbol: &str, days: u32) -> PriceSeries {
    fetch_or_empty(provider, symbol, days)
}

/// BLAKE3 fingerprint over every point of the series.
pub fn dataset_hash(series: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(series.symbol().as_bytes());
    for point in series.points() {
        hasher.update(&point.timestamp.timestamp_millis().to_le_bytes());
        hasher.update(&point.price.to_le_bytes());
        hasher.update(&point.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
