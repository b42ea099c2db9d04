//! Sanitizing raw provider output into a clean `PriceSeries`.
//!
//! Policy:
//! - rows with a non-finite or non-positive price are dropped
//! - non-finite or negative volume is replaced with 0
//! - rows are sorted by timestamp; for duplicate timestamps the last row wins

use serde::Serialize;

use crate::domain::{PricePoint, PriceSeries};

/// What sanitizing changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeReport {
    pub dropped_prices: usize,
    pub zeroed_volumes: usize,
    pub duplicates: usize,
}

impl SanitizeReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

pub fn sanitize(symbol: &str, raw: Vec<PricePoint>) -> (PriceSeries, SanitizeReport) {
    let mut report = SanitizeReport::default();

    let mut points: Vec<PricePoint> = raw
        .into_iter()
        .filter_map(|mut p| {
            if !p.price.is_finite() || p.price <= 0.0 {
                report.dropped_prices += 1;
                return None;
            }
            if !p.volume.is_finite() || p.volume < 0.0 {
                report.zeroed_volumes += 1;
                p.volume = 0.0;
            }
            Some(p)
        })
        .collect();

    // Stable sort keeps arrival order among equal timestamps, so the
    // reverse-dedup below keeps the latest arrival.
    points.sort_by_key(|p| p.timestamp);
    points.reverse();
    let before = points.len();
    points.dedup_by_key(|p| p.timestamp);
    points.reverse();
    report.duplicates = before - points.len();

    if !report.is_clean() {
        tracing::warn!(
            symbol,
            dropped_prices = report.dropped_prices,
            zeroed_volumes = report.zeroed_volumes,
            duplicates = report.duplicates,
            "sanitized upstream series"
        );
    }

    // Strictly increasing after sort + dedup, so construction cannot fail.
    let series = PriceSeries::new(symbol, points).unwrap_or_else(|_| PriceSeries::empty(symbol));
    (series, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn clean_input_passes_through() {
        let raw = vec![
            PricePoint::new(ts(1), 10.0, 1.0),
            PricePoint::new(ts(2), 11.0, 2.0),
        ];
        let (series, report) = sanitize("X", raw.clone());
        assert!(report.is_clean());
        assert_eq!(series.points(), raw.as_slice());
    }

    #[test]
    fn drops_bad_prices_and_zeroes_bad_volume() {
        let raw = vec![
            PricePoint::new(ts(1), f64::NAN, 1.0),
            PricePoint::new(ts(2), 11.0, f64::INFINITY),
            PricePoint::new(ts(3), -4.0, 1.0),
            PricePoint::new(ts(4), 12.0, -3.0),
        ];
        let (series, report) = sanitize("X", raw);
        assert_eq!(series.prices(), vec![11.0, 12.0]);
        assert_eq!(series.volumes(), vec![0.0, 0.0]);
        assert_eq!(report.dropped_prices, 2);
        assert_eq!(report.zeroed_volumes, 2);
    }

    #[test]
    fn sorts_and_keeps_last_duplicate() {
        let raw = vec![
            PricePoint::new(ts(3), 30.0, 1.0),
            PricePoint::new(ts(1), 10.0, 1.0),
            PricePoint::new(ts(3), 31.0, 1.0),
        ];
        let (series, report) = sanitize("X", raw);
        assert_eq!(series.prices(), vec![10.0, 31.0]);
        assert_eq!(report.duplicates, 1);
    }

    #[test]
    fn empty_input() {
        let (series, report) = sanitize("X", vec![]);
        assert!(series.is_empty());
        assert!(report.is_clean());
    }
}
