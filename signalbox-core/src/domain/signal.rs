//! Discrete position signals and the per-row record handed to reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Desired position: short, flat or long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Short,
    #[default]
    Flat,
    Long,
}

impl Signal {
    /// Numeric value in {-1, 0, +1}.
    pub fn value(self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }

    pub fn is_long(self) -> bool {
        self == Signal::Long
    }

    pub fn is_short(self) -> bool {
        self == Signal::Short
    }
}

/// One row of a signal frame.
///
/// `position_change` is `None` on the first row (no predecessor) and
/// `signal[i] - signal[i-1]` elsewhere, so it ranges over -2..=2 when a
/// strategy flips directly between short and long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub signal: Signal,
    pub position_change: Option<i8>,
    pub buy_signal: bool,
    pub sell_signal: bool,
}

impl SignalRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        price: f64,
        signal: Signal,
        position_change: Option<i8>,
    ) -> Self {
        Self {
            timestamp,
            price,
            signal,
            position_change,
            buy_signal: signal.is_long(),
            sell_signal: signal.is_short(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_values() {
        assert_eq!(Signal::Short.value(), -1);
        assert_eq!(Signal::Flat.value(), 0);
        assert_eq!(Signal::Long.value(), 1);
        assert_eq!(Signal::default(), Signal::Flat);
    }

    #[test]
    fn flags_mirror_signal() {
        let ts = DateTime::<Utc>::UNIX_EPOCH;
        let long = SignalRecord::new(ts, 1.0, Signal::Long, None);
        assert!(long.buy_signal && !long.sell_signal);
        let short = SignalRecord::new(ts, 1.0, Signal::Short, Some(-2));
        assert!(!short.buy_signal && short.sell_signal);
        let flat = SignalRecord::new(ts, 1.0, Signal::Flat, Some(1));
        assert!(!flat.buy_signal && !flat.sell_signal);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Signal::Long).unwrap(), "\"long\"");
    }
}
