//! Construction-time validation shared by every configurable component.
//!
//! Invalid configuration fails fast at construction: no component is ever
//! partially built from a bad window, fee rate or capital.

use thiserror::Error;

/// Default trading fee applied by the account and the decision environment.
pub const DEFAULT_FEE_RATE: f64 = 0.001;

/// Default starting capital.
pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

/// Configuration errors raised by component constructors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be >= 1 (got {value})")]
    InvalidWindow { name: &'static str, value: usize },

    #[error("threshold must be finite (got {0})")]
    InvalidThreshold(f64),

    #[error("fee_rate must be in [0, 1) (got {0})")]
    InvalidFeeRate(f64),

    #[error("initial_capital must be finite and >= 0 (got {0})")]
    InvalidCapital(f64),

    #[error("quantity must be finite and > 0 (got {0})")]
    InvalidQuantity(f64),
}

/// Reject a zero-length window.
pub fn require_window(name: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidWindow { name, value });
    }
    Ok(value)
}

/// Fee rate must satisfy `0 <= fee_rate < 1`.
pub fn require_fee_rate(fee_rate: f64) -> Result<f64, ConfigError> {
    if !(0.0..1.0).contains(&fee_rate) {
        return Err(ConfigError::InvalidFeeRate(fee_rate));
    }
    Ok(fee_rate)
}

pub fn require_capital(capital: f64) -> Result<f64, ConfigError> {
    if !capital.is_finite() || capital < 0.0 {
        return Err(ConfigError::InvalidCapital(capital));
    }
    Ok(capital)
}

pub fn require_quantity(quantity: f64) -> Result<f64, ConfigError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(ConfigError::InvalidQuantity(quantity));
    }
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_window_rejected() {
        assert_eq!(
            require_window("window", 0),
            Err(ConfigError::InvalidWindow {
                name: "window",
                value: 0
            })
        );
        assert_eq!(require_window("window", 1), Ok(1));
    }

    #[test]
    fn fee_rate_bounds() {
        assert!(require_fee_rate(0.0).is_ok());
        assert!(require_fee_rate(0.999).is_ok());
        assert!(require_fee_rate(1.0).is_err());
        assert!(require_fee_rate(-0.01).is_err());
        assert!(require_fee_rate(f64::NAN).is_err());
    }

    #[test]
    fn capital_and_quantity() {
        assert!(require_capital(0.0).is_ok());
        assert!(require_capital(-1.0).is_err());
        assert!(require_capital(f64::INFINITY).is_err());
        assert!(require_quantity(0.0).is_err());
        assert!(require_quantity(2.5).is_ok());
    }

    #[test]
    fn error_messages_name_the_field() {
        let err = require_window("short_window", 0).unwrap_err();
        assert_eq!(err.to_string(), "short_window must be >= 1 (got 0)");
    }
}
