//! CoinGecko data provider.
//!
//! Two endpoints are used: `/coins/{id}/market_chart` for a price/volume
//! history and `/coins/markets` for the top-by-market-cap listing. Parsing is
//! split from transport so the response handling can be tested offline.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use super::provider::{build_client, get_json, DataError, PriceProvider, RetryPolicy};
use super::sanitize::sanitize;
use crate::domain::{PricePoint, PriceSeries};

pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_TOP_LIMIT: usize = 10;

/// `market_chart` response: `[[unix_ms, value], ...]` arrays.
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<[f64; 2]>,
    #[serde(default)]
    total_volumes: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct MarketItem {
    symbol: String,
    current_price: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    market_cap: Option<f64>,
}

/// One row of the top-markets listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub current_price: f64,
    #[serde(rename = "24h_change")]
    pub change_24h: Option<f64>,
    pub market_cap: f64,
}

pub struct CoinGeckoProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    vs_currency: String,
    retry: RetryPolicy,
}

impl CoinGeckoProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(COINGECKO_API_URL)
    }

    /// Point the provider at a different host (mirrors, test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(concat!("signalbox/", env!("CARGO_PKG_VERSION")))?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            vs_currency: "usd".into(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn market_chart_url(&self, coin_id: &str, days: u32) -> String {
        format!(
            "{}/coins/{coin_id}/market_chart?vs_currency={}&days={days}",
            self.base_url, self.vs_currency
        )
    }

    fn markets_url(&self, limit: usize) -> String {
        format!(
            "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={limit}&page=1&sparkline=false",
            self.base_url, self.vs_currency
        )
    }

    /// Top coins by market cap, highest first.
    pub fn top_markets(&self, limit: usize) -> Result<Vec<MarketSnapshot>, DataError> {
        tracing::info!(limit, "fetching top markets");
        let items: Vec<MarketItem> = get_json(&self.client, &self.markets_url(limit), self.retry)?;
        let snapshots = parse_markets(items);
        tracing::info!(count = snapshots.len(), "fetched top markets");
        Ok(snapshots)
    }
}

fn parse_market_chart(coin_id: &str, resp: MarketChartResponse) -> Result<PriceSeries, DataError> {
    if resp.prices.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: coin_id.to_string(),
        });
    }

    let mut raw = Vec::with_capacity(resp.prices.len());
    for (i, [ts_ms, price]) in resp.prices.iter().copied().enumerate() {
        let timestamp = DateTime::from_timestamp_millis(ts_ms as i64).ok_or_else(|| {
            DataError::ResponseFormatChanged(format!("invalid timestamp: {ts_ms}"))
        })?;
        // Volumes share the price timestamps; missing entries count as no volume.
        let volume = resp
            .total_volumes
            .get(i)
            .filter(|[vts, _]| *vts == ts_ms)
            .map(|[_, v]| *v)
            .unwrap_or(0.0);
        raw.push(PricePoint::new(timestamp, price, volume));
    }

    let (series, _) = sanitize(coin_id, raw);
    Ok(series)
}

fn parse_markets(items: Vec<MarketItem>) -> Vec<MarketSnapshot> {
    items
        .into_iter()
        .filter_map(|item| {
            Some(MarketSnapshot {
                symbol: item.symbol,
                current_price: item.current_price?,
                change_24h: item.price_change_percentage_24h,
                market_cap: item.market_cap.unwrap_or(0.0),
            })
        })
        .collect()
}

impl PriceProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "coingecko"
    }

    /// `symbol` is a CoinGecko coin id such as `bitcoin`.
    fn fetch(&self, symbol: &str, days: u32) -> Result<PriceSeries, DataError> {
        let resp: MarketChartResponse =
            get_json(&self.client, &self.market_chart_url(symbol, days), self.retry)?;
        parse_market_chart(symbol, resp)
    }
}
