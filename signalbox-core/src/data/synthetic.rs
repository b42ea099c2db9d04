//! Deterministic synthetic price series for offline runs and tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{PricePoint, PriceSeries};

const START_PRICE: f64 = 100.0;

/// A daily random walk of `n` points starting 2024-01-01 UTC.
///
/// The same `(symbol, seed)` always yields the same series.
pub fn synthetic_series(symbol: &str, n: usize, seed: u64) -> PriceSeries {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    hasher.update(&seed.to_le_bytes());
    let mut rng = StdRng::from_seed(*hasher.finalize().as_bytes());

    let start: DateTime<Utc> = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    let mut price = START_PRICE;
    let points = (0..n)
        .map(|i| {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            price *= 1.0 + daily_return;
            let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();
            PricePoint::new(start + Duration::days(i as i64), price, volume)
        })
        .collect();

    PriceSeries::new(symbol, points).unwrap_or_else(|_| PriceSeries::empty(symbol))
}
