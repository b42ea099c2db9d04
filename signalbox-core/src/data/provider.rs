//! Price provider trait and structured error types.
//!
//! The `PriceProvider` trait abstracts over data sources (CoinGecko, Yahoo,
//! CSV) so they can be swapped and mocked. Caching sits above this trait;
//! providers don't know about the cache.

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::{PriceSeries, SeriesError};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("series error: {0}")]
    Series(#[from] SeriesError),
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                return DataError::RateLimited;
            }
            return DataError::HttpStatus {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        if err.is_decode() {
            return DataError::ResponseFormatChanged(err.to_string());
        }
        DataError::NetworkUnreachable(err.to_string())
    }
}

/// Trait for price providers.
///
/// Implementations return a sanitized, chronologically ordered series.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the trailing `days` of price/volume history for `symbol`.
    fn fetch(&self, symbol: &str, days: u32) -> Result<PriceSeries, DataError>;
}

impl<P: PriceProvider + ?Sized> PriceProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, symbol: &str, days: u32) -> Result<PriceSeries, DataError> {
        (**self).fetch(symbol, days)
    }
}

/// Fetch, degrading any provider failure to an empty series.
///
/// Upstream failures are logged and never reach the core; an empty series
/// produces empty indicator and signal frames downstream.
pub fn fetch_or_empty(provider: &dyn PriceProvider, symbol: &str, days: u32) -> PriceSeries {
    match provider.fetch(symbol, days) {
        Ok(series) => {
            tracing::info!(provider = provider.name(), symbol, points = series.len(), "fetched series");
            series
        }
        Err(err) => {
            tracing::error!(provider = provider.name(), symbol, error = %err, "fetch failed");
            PriceSeries::empty(symbol)
        }
    }
}

/// Retry settings shared by the HTTP providers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

pub(crate) fn build_client(user_agent: &str) -> Result<reqwest::blocking::Client, DataError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(user_agent)
        .build()
        .map_err(|e| DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))
}

/// GET `url` and decode the JSON body, retrying rate limits and transient
/// network errors with exponential backoff.
pub(crate) fn get_json<T: DeserializeOwned>(
    client: &reqwest::blocking::Client,
    url: &str,
    retry: RetryPolicy,
) -> Result<T, DataError> {
    let mut last_error = None;

    for attempt in 0..=retry.max_retries {
        if attempt > 0 {
            let delay = retry.base_delay * 2u32.pow(attempt - 1);
            tracing::debug!(url, attempt, ?delay, "retrying request");
            std::thread::sleep(delay);
        }

        match client.get(url).send() {
            Ok(resp) => {
                let status = resp.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    last_error = Some(DataError::RateLimited);
                    continue;
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(DataError::HttpStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                if !status.is_success() {
                    last_error = Some(DataError::HttpStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                    continue;
                }

                return resp.json::<T>().map_err(|e| {
                    DataError::ResponseFormatChanged(format!("failed to parse response: {e}"))
                });
            }
            Err(e) => {
                if e.is_connect() || e.is_timeout() {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                return Err(e.into());
            }
        }
    }

    Err(last_error.unwrap_or_else(|| DataError::NetworkUnreachable("max retries exceeded".into())))
}
