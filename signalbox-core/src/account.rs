//! Trading account: capital and position bookkeeping under a proportional fee.
//!
//! Both trade paths are guarded: a buy needs `capital >= price * qty * (1 + fee)`
//! and a sell needs `position >= qty`, so the account can never go short or
//! overdraw. A rejected trade leaves the state untouched and comes back as a
//! [`TradeError`]; the caller decides whether to retry with a smaller size.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{
    require_capital, require_fee_rate, ConfigError, DEFAULT_FEE_RATE, DEFAULT_INITIAL_CAPITAL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// Outcome of an accepted trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub fee: f64,
    /// Signed change to capital (negative for buys).
    pub cash_delta: f64,
}

/// Why a trade was rejected. The account is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeError {
    #[error("insufficient funds: need {required:.4}, have {available:.4}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient position: selling {requested}, holding {held}")]
    InsufficientPosition { requested: f64, held: f64 },

    #[error("invalid order: price={price}, quantity={quantity}")]
    InvalidOrder { price: f64, quantity: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradingAccount {
    initial_capital: f64,
    fee_rate: f64,
    capital: f64,
    position: f64,
    total_fees: f64,
}

impl TradingAccount {
    pub fn new(initial_capital: f64, fee_rate: f64) -> Result<Self, ConfigError> {
        let initial_capital = require_capital(initial_capital)?;
        Ok(Self {
            initial_capital,
            fee_rate: require_fee_rate(fee_rate)?,
            capital: initial_capital,
            position: 0.0,
            total_fees: 0.0,
        })
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn total_fees(&self) -> f64 {
        self.total_fees
    }

    fn check_order(price: f64, quantity: f64) -> Result<(), TradeError> {
        if !price.is_finite() || price <= 0.0 || !quantity.is_finite() || quantity <= 0.0 {
            return Err(TradeError::InvalidOrder { price, quantity });
        }
        Ok(())
    }

    /// Buy `quantity` at `price`, paying `price * quantity * (1 + fee_rate)`.
    pub fn buy(&mut self, price: f64, quantity: f64) -> Result<Fill, TradeError> {
        Self::check_order(price, quantity)?;
        let notional = price * quantity;
        let cost = notional * (1.0 + self.fee_rate);
        if self.capital < cost {
            return Err(TradeError::InsufficientFunds {
                required: cost,
                available: self.capital,
            });
        }
        let fee = notional * self.fee_rate;
        self.capital -= cost;
        self.position += quantity;
        self.total_fees += fee;
        Ok(Fill {
            side: Side::Buy,
            price,
            quantity,
            fee,
            cash_delta: -cost,
        })
    }

    /// Sell `quantity` at `price`, receiving `price * quantity * (1 - fee_rate)`.
    pub fn sell(&mut self, price: f64, quantity: f64) -> Result<Fill, TradeError> {
        Self::check_order(price, quantity)?;
        if self.position < quantity {
            return Err(TradeError::InsufficientPosition {
                requested: quantity,
                held: self.position,
            });
        }
        let notional = price * quantity;
        let revenue = notional * (1.0 - self.fee_rate);
        let fee = notional * self.fee_rate;
        self.capital += revenue;
        self.position -= quantity;
        self.total_fees += fee;
        Ok(Fill {
            side: Side::Sell,
            price,
            quantity,
            fee,
            cash_delta: revenue,
        })
    }

    /// Capital plus the held position marked at `current_price`.
    pub fn portfolio_value(&self, current_price: f64) -> f64 {
        self.capital + self.position * current_price
    }
}

impl Default for TradingAccount {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            fee_rate: DEFAULT_FEE_RATE,
            capital: DEFAULT_INITIAL_CAPITAL,
            position: 0.0,
            total_fees: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn buy_fails_when_cost_exceeds_capital() {
        let mut account = TradingAccount::new(100.0, 0.001).unwrap();
        let before = account.clone();
        let err = account.buy(100.0, 1.0).unwrap_err();
        assert!(matches!(err, TradeError::InsufficientFunds { .. }));
        assert_eq!(account, before);
    }

    #[test]
    fn buy_succeeds_with_enough_capital() {
        let mut account = TradingAccount::new(101.0, 0.001).unwrap();
        let fill = account.buy(100.0, 1.0).unwrap();
        assert_approx(account.capital(), 0.9, 1e-9);
        assert_eq!(account.position(), 1.0);
        assert_approx(fill.fee, 0.1, 1e-12);
        assert_approx(fill.cash_delta, -100.1, 1e-9);
    }

    #[test]
    fn sell_without_position_always_fails() {
        let mut account = TradingAccount::new(1_000_000.0, 0.001).unwrap();
        let err = account.sell(10.0, 1.0).unwrap_err();
        assert_eq!(
            err,
            TradeError::InsufficientPosition {
                requested: 1.0,
                held: 0.0
            }
        );
        assert_eq!(account.capital(), 1_000_000.0);
    }

    #[test]
    fn sell_credits_net_of_fee() {
        let mut account = TradingAccount::new(1_000.0, 0.01).unwrap();
        account.buy(10.0, 10.0).unwrap(); // cost 101
        account.sell(20.0, 4.0).unwrap(); // revenue 79.2
        assert_approx(account.capital(), 1_000.0 - 101.0 + 79.2, 1e-9);
        assert_approx(account.position(), 6.0, 1e-12);
        assert_approx(account.total_fees(), 1.0 + 0.8, 1e-12);
    }

    #[test]
    fn oversell_rejected() {
        let mut account = TradingAccount::new(1_000.0, 0.0).unwrap();
        account.buy(10.0, 2.0).unwrap();
        assert!(account.sell(10.0, 3.0).is_err());
        assert_eq!(account.position(), 2.0);
    }

    #[test]
    fn portfolio_value_is_pure() {
        let mut account = TradingAccount::new(1_000.0, 0.0).unwrap();
        account.buy(10.0, 5.0).unwrap();
        let snapshot = account.clone();
        assert_eq!(account.portfolio_value(12.0), 950.0 + 60.0);
        assert_eq!(account, snapshot);
    }

    #[test]
    fn invalid_orders_rejected() {
        let mut account = TradingAccount::default();
        assert!(matches!(
            account.buy(-1.0, 1.0),
            Err(TradeError::InvalidOrder { .. })
        ));
        assert!(matches!(
            account.sell(1.0, 0.0),
            Err(TradeError::InvalidOrder { .. })
        ));
    }

    #[test]
    fn constructor_validates() {
        assert!(TradingAccount::new(100.0, 1.0).is_err());
        assert!(TradingAccount::new(-5.0, 0.001).is_err());
        let account = TradingAccount::default();
        assert_eq!(account.capital(), 10_000.0);
        assert_eq!(account.fee_rate(), 0.001);
    }
}
