//! CSV import and export of price series.
//!
//! Format: a header row `timestamp,price,volume`, RFC 3339 timestamps.
//! Imported rows pass through [`sanitize`](super::sanitize::sanitize).

use std::path::Path;

use super::provider::DataError;
use super::sanitize::sanitize;
use crate::domain::{PricePoint, PriceSeries};

pub fn read_series_csv(path: &Path, symbol: &str) -> Result<PriceSeries, DataError> {
    let mut reader = csv::Reader::from_path(path)?;
    let raw = reader
        .deserialize::<PricePoint>()
        .collect::<Result<Vec<_>, _>>()?;
    let (series, report) = sanitize(symbol, raw);
    tracing::info!(
        path = %path.display(),
        symbol,
        points = series.len(),
        dropped = report.dropped_prices,
        "imported series from csv"
    );
    Ok(series)
}

pub fn write_series_csv(path: &Path, series: &PriceSeries) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in series.points() {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic_series;
    use std::io::Write;

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syn.csv");
        let series = synthetic_series("SYN", 25, 3);

        write_series_csv(&path, &series).unwrap();
        let loaded = read_series_csv(&path, "SYN").unwrap();

        assert_eq!(loaded, series);
    }

    #[test]
    fn header_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syn.csv");
        write_series_csv(&path, &synthetic_series("SYN", 2, 3)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("timestamp,price,volume\n"));
    }

    #[test]
    fn import_sanitizes_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dirty.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "timestamp,price,volume").unwrap();
        writeln!(f, "2024-01-03T00:00:00Z,12.0,5").unwrap();
        writeln!(f, "2024-01-01T00:00:00Z,10.0,-1").unwrap();
        writeln!(f, "2024-01-02T00:00:00Z,0.0,5").unwrap();
        drop(f);

        let series = read_series_csv(&path, "D").unwrap();
        assert_eq!(series.prices(), vec![10.0, 12.0]);
        assert_eq!(series.volumes(), vec![0.0, 5.0]);
    }

    #[test]
    fn missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_series_csv(&dir.path().join("absent.csv"), "X").unwrap_err();
        assert!(matches!(err, DataError::Csv(_)));
    }

    #[test]
    fn malformed_row_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "timestamp,price,volume\nyesterday,1.0,1.0\n").unwrap();
        assert!(read_series_csv(&path, "X").is_err());
    }
}
