//! In-memory series cache with an injectable expiry policy and clock.
//!
//! `SeriesCache` wraps any [`PriceProvider`] and is itself a provider, so
//! callers never know whether a series came from the network or memory.
//! Entries are keyed by `(symbol, days)`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use super::provider::{DataError, PriceProvider};
use crate::domain::PriceSeries;

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Decides whether a cached entry may still be served.
pub trait ExpiryPolicy: Send + Sync {
    fn is_fresh(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool;
}

/// Entries expire `ttl` after they were fetched.
#[derive(Debug, Clone, Copy)]
pub struct TtlExpiry {
    ttl: Duration,
}

impl TtlExpiry {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl ExpiryPolicy for TtlExpiry {
    fn is_fresh(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - fetched_at < self.ttl
    }
}

/// Entries live until explicitly invalidated.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverExpire;

impl ExpiryPolicy for NeverExpire {
    fn is_fresh(&self, _fetched_at: DateTime<Utc>, _now: DateTime<Utc>) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    series: PriceSeries,
    fetched_at: DateTime<Utc>,
}

pub struct SeriesCache<P> {
    provider: P,
    policy: Box<dyn ExpiryPolicy>,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<(String, u32), CacheEntry>>,
}

impl<P: PriceProvider> SeriesCache<P> {
    pub fn new(provider: P, policy: impl ExpiryPolicy + 'static) -> Self {
        Self {
            provider,
            policy: Box::new(policy),
            clock: Arc::new(SystemClock),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<(String, u32), CacheEntry>> {
        // A panic while holding the lock leaves the map itself consistent.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Serve a fresh cached series or fetch and store a new one.
    ///
    /// Failed fetches are not cached.
    pub fn get(&self, symbol: &str, days: u32) -> Result<PriceSeries, DataError> {
        let key = (symbol.to_string(), days);
        let now = self.clock.now();

        if let Some(entry) = self.entries().get(&key) {
            if self.policy.is_fresh(entry.fetched_at, now) {
                tracing::debug!(symbol, days, "cache hit");
                return Ok(entry.series.clone());
            }
            tracing::debug!(symbol, days, "cache entry expired");
        }

        let series = self.provider.fetch(symbol, days)?;
        self.entries().insert(
            key,
            CacheEntry {
                series: series.clone(),
                fetched_at: now,
            },
        );
        Ok(series)
    }

    /// Drop every entry for `symbol`.
    pub fn invalidate(&self, symbol: &str) {
        self.entries().retain(|(s, _), _| s != symbol);
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: PriceProvider> PriceProvider for SeriesCache<P> {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn fetch(&self, symbol: &str, days: u32) -> Result<PriceSeries, DataError> {
        self.get(symbol, days)
    }
}
