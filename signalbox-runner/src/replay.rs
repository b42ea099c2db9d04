//! Signal replay: drives the guarded `TradingAccount` from a `SignalFrame`.
//!
//! Rules:
//! - position_change > 0: buy `trade_quantity` at the row's price
//! - position_change < 0: sell the whole held quantity
//! - rejected trades are recorded and logged, never raised
//!
//! The trace carries one portfolio value per row, marked at that row's price
//! after any trade on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use signalbox_core::config::{
    require_capital, require_fee_rate, require_quantity, DEFAULT_FEE_RATE, DEFAULT_INITIAL_CAPITAL,
};
use signalbox_core::{ConfigError, Fill, Side, SignalFrame, TradingAccount};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default = "default_capital")]
    pub initial_capital: f64,
    #[serde(default = "default_fee_rate")]
    pub fee_rate: f64,
    #[serde(default = "default_trade_quantity")]
    pub trade_quantity: f64,
}

fn default_capital() -> f64 {
    DEFAULT_INITIAL_CAPITAL
}

fn default_fee_rate() -> f64 {
    DEFAULT_FEE_RATE
}

fn default_trade_quantity() -> f64 {
    AccountConfig::DEFAULT_TRADE_QUANTITY
}

impl AccountConfig {
    pub const DEFAULT_TRADE_QUANTITY: f64 = 1.0;

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_capital(self.initial_capital)?;
        require_fee_rate(self.fee_rate)?;
        require_quantity(self.trade_quantity)?;
        Ok(())
    }

    pub fn open_account(&self) -> Result<TradingAccount, ConfigError> {
        self.validate()?;
        TradingAccount::new(self.initial_capital, self.fee_rate)
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            fee_rate: DEFAULT_FEE_RATE,
            trade_quantity: Self::DEFAULT_TRADE_QUANTITY,
        }
    }
}

/// An executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub fill: Fill,
}

/// A trade the account refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedTrade {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTrace {
    pub initial_capital: f64,
    /// One mark-to-market value per signal row.
    pub values: Vec<f64>,
    pub trades: Vec<TradeEvent>,
    pub rejected: Vec<RejectedTrade>,
    pub final_capital: f64,
    pub final_position: f64,
    pub total_fees: f64,
}

impl PortfolioTrace {
    pub fn final_value(&self) -> f64 {
        self.values.last().copied().unwrap_or(self.initial_capital)
    }
}

pub fn replay_signals(
    frame: &SignalFrame,
    config: &AccountConfig,
) -> Result<PortfolioTrace, ConfigError> {
    let mut account = config.open_account()?;
    let mut values = Vec::with_capacity(frame.len());
    let mut trades = Vec::new();
    let mut rejected = Vec::new();

    for (index, record) in frame.records.iter().enumerate() {
        let price = record.price;
        let attempt = match record.position_change {
            Some(change) if change > 0 => Some((Side::Buy, config.trade_quantity)),
            Some(change) if change < 0 => {
                // Flat accounts still attempt the configured size so the
                // refusal is recorded.
                let held = account.position();
                let quantity = if held > 0.0 { held } else { config.trade_quantity };
                Some((Side::Sell, quantity))
            }
            _ => None,
        };

        if let Some((side, quantity)) = attempt {
            let result = match side {
                Side::Buy => account.buy(price, quantity),
                Side::Sell => account.sell(price, quantity),
            };
            match result {
                Ok(fill) => {
                    tracing::debug!(index, ?side, price, quantity, "trade filled");
                    trades.push(TradeEvent {
                        index,
                        timestamp: record.timestamp,
                        fill,
                    });
                }
                Err(err) => {
                    tracing::warn!(index, ?side, price, quantity, error = %err, "trade rejected");
                    rejected.push(RejectedTrade {
                        index,
                        timestamp: record.timestamp,
                        side,
                        price,
                        quantity,
                        reason: err.to_string(),
                    });
                }
            }
        }

        values.push(account.portfolio_value(price));
    }

    tracing::info!(
        strategy = %frame.strategy,
        rows = frame.len(),
        trades = trades.len(),
        rejected = rejected.len(),
        "replay complete"
    );

    Ok(PortfolioTrace {
        initial_capital: account.initial_capital(),
        values,
        trades,
        rejected,
        final_capital: account.capital(),
        final_position: account.position(),
        total_fees: account.total_fees(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use signalbox_core::{
        FrameConfig, IndicatorFrame, PricePoint, PriceSeries, Signal, SignalRecord,
    };

    /// Build a frame directly from (price, signal) pairs.
    fn frame(rows: &[(f64, Signal)]) -> SignalFrame {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let points: Vec<PricePoint> = rows
            .iter()
            .enumerate()
            .map(|(i, &(p, _))| PricePoint::new(base + Duration::days(i as i64), p, 1.0))
            .collect();
        let series = PriceSeries::new("T", points.clone()).unwrap();
        let records = rows
            .iter()
            .enumerate()
            .map(|(i, &(p, s))| {
                let change = (i > 0).then(|| s.value() - rows[i - 1].1.value());
                SignalRecord::new(points[i].timestamp, p, s, change)
            })
            .collect();
        SignalFrame {
            strategy: "test".into(),
            indicators: IndicatorFrame::compute(&series, FrameConfig::default()),
            records,
        }
    }

    fn config(capital: f64, fee: f64, qty: f64) -> AccountConfig {
        AccountConfig {
            initial_capital: capital,
            fee_rate: fee,
            trade_quantity: qty,
        }
    }

    #[test]
    fn long_then_flat_round_trip() {
        let f = frame(&[
            (100.0, Signal::Flat),
            (100.0, Signal::Long),
            (110.0, Signal::Long),
            (120.0, Signal::Flat),
        ]);
        let trace = replay_signals(&f, &config(1_000.0, 0.0, 2.0)).unwrap();

        assert_eq!(trace.values, vec![1_000.0, 1_000.0, 1_020.0, 1_040.0]);
        assert_eq!(trace.trades.len(), 2);
        assert_eq!(trace.trades[0].fill.side, Side::Buy);
        assert_eq!(trace.trades[1].fill.quantity, 2.0);
        assert_eq!(trace.final_position, 0.0);
        assert!(trace.rejected.is_empty());
        assert_eq!(trace.final_value(), 1_040.0);
    }

    #[test]
    fn short_signal_from_flat_is_rejected_not_raised() {
        let f = frame(&[(100.0, Signal::Flat), (100.0, Signal::Short), (90.0, Signal::Flat)]);
        let trace = replay_signals(&f, &config(1_000.0, 0.001, 1.0)).unwrap();

        assert_eq!(trace.rejected.len(), 1);
        assert_eq!(trace.rejected[0].side, Side::Sell);
        assert_eq!(trace.rejected[0].index, 1);
        // Short back to flat is a buy.
        assert_eq!(trace.trades.len(), 1);
        assert_eq!(trace.trades[0].fill.side, Side::Buy);
        assert_eq!(trace.values.len(), 3);
    }

    #[test]
    fn unaffordable_buy_rejected() {
        let f = frame(&[(100.0, Signal::Flat), (100.0, Signal::Long)]);
        let trace = replay_signals(&f, &config(100.0, 0.001, 1.0)).unwrap();
        assert_eq!(trace.rejected.len(), 1);
        assert!(trace.rejected[0].reason.contains("insufficient"));
        assert_eq!(trace.values, vec![100.0, 100.0]);
    }

    #[test]
    fn fees_accumulate() {
        let f = frame(&[
            (100.0, Signal::Flat),
            (100.0, Signal::Long),
            (100.0, Signal::Flat),
        ]);
        let trace = replay_signals(&f, &config(1_000.0, 0.01, 1.0)).unwrap();
        assert!((trace.total_fees - 2.0).abs() < 1e-9);
        assert!((trace.final_value() - 998.0).abs() < 1e-9);
    }

    #[test]
    fn empty_frame_empty_trace() {
        let trace = replay_signals(&frame(&[]), &AccountConfig::default()).unwrap();
        assert!(trace.values.is_empty());
        assert_eq!(trace.final_value(), DEFAULT_INITIAL_CAPITAL);
    }

    #[test]
    fn invalid_account_config() {
        let f = frame(&[(100.0, Signal::Flat)]);
        assert!(replay_signals(&f, &config(1_000.0, 0.0, 0.0)).is_err());
        assert!(replay_signals(&f, &config(-1.0, 0.0, 1.0)).is_err());
    }
}
