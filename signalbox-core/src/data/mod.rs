//! Data collaborators: remote providers, sanitizing, caching, CSV and
//! synthetic series.
//!
//! Nothing below this module is needed by the indicator/signal/account core;
//! it exists so hosts can obtain a clean [`crate::domain::PriceSeries`].

pub mod cache;
pub mod coingecko;
pub mod csv_io;
pub mod provider;
pub mod sanitize;
pub mod synthetic;
pub mod yahoo;

pub use cache::{Clock, ExpiryPolicy, NeverExpire, SeriesCache, SystemClock, TtlExpiry};
pub use coingecko::{CoinGeckoProvider, MarketSnapshot};
pub use csv_io::{read_series_csv, write_series_csv};
pub use provider::{fetch_or_empty, DataError, PriceProvider};
pub use sanitize::{sanitize, SanitizeReport};
pub use synthetic::synthetic_series;
pub use yahoo::{StockSnapshot, YahooProvider, DEFAULT_STOCK_TICKERS};
