//! Domain types for Signalbox

pub mod series;
pub mod signal;

pub use series::{PricePoint, PriceSeries, SeriesError};
pub use signal::{Signal, SignalRecord};
