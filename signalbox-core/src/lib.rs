//! Signalbox Core: price series, rolling indicators, signal generators,
//! capital bookkeeping and the decision environment.
//!
//! This crate contains the deterministic heart of the sandbox:
//! - Domain types (price points, validated series, discrete signals)
//! - Rolling indicator engine with a causal, min-periods-1 policy
//! - Rule-based signal generators (trend following, mean reversion)
//! - Guarded trading account (capital + position under a proportional fee)
//! - Decision environment with a reset/step protocol for external policies
//! - Data collaborators (providers, sanitizing, explicit cache, CSV)
//!
//! Everything except the `data` providers is pure and performs no I/O.

pub mod account;
pub mod config;
pub mod data;
pub mod domain;
pub mod environment;
pub mod indicators;
pub mod policy;
pub mod signals;

pub use account::{Fill, Side, TradeError, TradingAccount};
pub use config::ConfigError;
pub use domain::{PricePoint, PriceSeries, SeriesError, Signal, SignalRecord};
pub use environment::{Action, DecisionEnvironment, EnvConfig, EnvError, ObservationWindow, StepOutcome};
pub use indicators::{FrameConfig, IndicatorFrame, IndicatorRow};
pub use policy::{HoldPolicy, ModelArtifact, Policy, RandomPolicy, ScriptedPolicy};
pub use signals::{MeanReversion, SignalFrame, SignalGenerator, Strategy, StrategyConfig, TrendFollower};
