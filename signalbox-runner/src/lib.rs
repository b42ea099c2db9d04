//! Signalbox Runner: signal replay, policy evaluation, batch runs, metrics.
//!
//! This crate builds on `signalbox-core` to provide:
//! - TOML run configuration with content-addressed run ids
//! - Data loading from synthetic, CSV, or remote sources
//! - Signal replay against the guarded trading account
//! - Policy evaluation through the decision environment
//! - Parallel batch runs, performance metrics, and artifact export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod evaluate;
pub mod export;
pub mod metrics;
pub mod replay;
pub mod runner;
pub mod source;

pub use batch::{run_batch, summarize, BatchSummary};
pub use config::{AgentConfig, ConfigError, PolicyConfig, RunConfig, RunId};
pub use data_loader::{dataset_hash, load_series, DataConfig};
pub use evaluate::{evaluate_policy, EpisodeReport};
pub use metrics::PerformanceMetrics;
pub use replay::{replay_signals, AccountConfig, PortfolioTrace, RejectedTrade, TradeEvent};
pub use runner::{run_from_config, run_on_series, RunError};
pub use source::{DecisionSource, RunOutcome, RunResult, RunSettings, SCHEMA_VERSION};
