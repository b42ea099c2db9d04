//! Yahoo Finance data provider.
//!
//! Fetches bars from Yahoo's v8 chart API. Daily bars back `PriceProvider`;
//! one-minute intraday bars back the day snapshot for a list of tickers.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The CSV import path is the fallback when Yahoo is unavailable.

use serde::{Deserialize, Serialize};

use super::provider::{build_client, get_json, DataError, PriceProvider, RetryPolicy};
use super::sanitize::sanitize;
use crate::domain::{PricePoint, PriceSeries};

pub const DEFAULT_STOCK_TICKERS: [&str; 3] = ["AAPL", "GOOGL", "MSFT"];

const YAHOO_CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Intraday summary for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub ticker: String,
    pub current_price: f64,
    pub day_high: f64,
    pub day_low: f64,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(YAHOO_CHART_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    fn chart_url(&self, symbol: &str, range: &str, interval: &str) -> String {
        format!("{}/{symbol}?range={range}&interval={interval}", self.base_url)
    }

    /// Current price and day range for each ticker from today's one-minute bars.
    ///
    /// A ticker that fails is logged and left out; the rest are still returned.
    pub fn day_snapshots(&self, tickers: &[&str]) -> Vec<StockSnapshot> {
        tickers
            .iter()
            .filter_map(|&ticker| {
                let result = get_json::<ChartResponse>(
                    &self.client,
                    &self.chart_url(ticker, "1d", "1m"),
                    self.retry,
                )
                .and_then(|resp| parse_snapshot(ticker, resp));
                match result {
                    Ok(snap) => Some(snap),
                    Err(err) => {
                        tracing::error!(ticker, error = %err, "stock snapshot failed");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Days to the smallest Yahoo range that covers them.
fn range_for_days(days: u32) -> &'static str {
    match days {
        0..=5 => "5d",
        6..=30 => "1mo",
        31..=90 => "3mo",
        91..=180 => "6mo",
        181..=365 => "1y",
        366..=730 => "2y",
        731..=1825 => "5y",
        _ => "max",
    }
}

fn first_quote(symbol: &str, resp: ChartResponse) -> Result<(Vec<i64>, QuoteData), DataError> {
    let result = resp.chart.result.ok_or_else(|| {
        if let Some(err) = resp.chart.error {
            if err.code == "Not Found" {
                DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                }
            } else {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
        } else {
            DataError::ResponseFormatChanged("empty result with no error".into())
        }
    })?;

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

    let timestamps = data
        .timestamp
        .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

    Ok((timestamps, quote))
}

fn parse_series(symbol: &str, resp: ChartResponse) -> Result<PriceSeries, DataError> {
    let (timestamps, quote) = first_quote(symbol, resp)?;

    let mut raw = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let timestamp = chrono::DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;
        // Null closes are non-trading rows; sanitize drops them as NaN prices.
        let close = quote.close.get(i).copied().flatten().unwrap_or(f64::NAN);
        let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0);
        raw.push(PricePoint::new(timestamp, close, volume));
    }

    let (series, _) = sanitize(symbol, raw);
    if series.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }
    Ok(series)
}

fn parse_snapshot(ticker: &str, resp: ChartResponse) -> Result<StockSnapshot, DataError> {
    let (_, quote) = first_quote(ticker, resp)?;

    let finite = |v: &Vec<Option<f64>>| -> Vec<f64> {
        v.iter().filter_map(|x| *x).filter(|x| x.is_finite()).collect()
    };
    let closes = finite(&quote.close);
    let current_price = *closes.last().ok_or_else(|| DataError::SymbolNotFound {
        symbol: ticker.to_string(),
    })?;
    let day_high = finite(&quote.high).into_iter().fold(current_price, f64::max);
    let day_low = finite(&quote.low).into_iter().fold(current_price, f64::min);

    Ok(StockSnapshot {
        ticker: ticker.to_string(),
        current_price,
        day_high,
        day_low,
    })
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str, days: u32) -> Result<PriceSeries, DataError> {
        let url = self.chart_url(symbol, range_for_days(days), "1d");
        let resp: ChartResponse = get_json(&self.client, &url, self.retry)?;
        parse_series(symbol, resp)
    }
}
