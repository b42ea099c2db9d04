//! Strategy-agnostic decision sources.
//!
//! A run is either rule-based (a [`Strategy`] whose signals are replayed
//! against the guarded account) or agent-based (an opaque [`Policy`] stepped
//! through the decision environment). Both produce a [`RunResult`].

use std::fmt;

use serde::Serialize;

use signalbox_core::{
    DecisionEnvironment, EnvConfig, FrameConfig, Policy, PriceSeries, SignalFrame,
    SignalGenerator, Strategy,
};

use crate::data_loader::dataset_hash;
use crate::evaluate::{evaluate_policy, EpisodeReport};
use crate::metrics::PerformanceMetrics;
use crate::replay::{replay_signals, AccountConfig, PortfolioTrace};
use crate::runner::RunError;

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Account and environment settings shared by both kinds of source.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSettings {
    pub account: AccountConfig,
    pub environment: EnvConfig,
    /// Windows for the environment's observation columns.
    pub frame: FrameConfig,
}

pub enum DecisionSource {
    Rules(Strategy),
    Agent(Box<dyn Policy>),
}

impl fmt::Debug for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionSource::Rules(s) => f.debug_tuple("Rules").field(s).finish(),
            DecisionSource::Agent(p) => f.debug_tuple("Agent").field(&p.name()).finish(),
        }
    }
}

impl DecisionSource {
    pub fn name(&self) -> &str {
        match self {
            DecisionSource::Rules(s) => s.name(),
            DecisionSource::Agent(p) => p.name(),
        }
    }

    pub fn run(&mut self, series: &PriceSeries, settings: &RunSettings) -> Result<RunResult, RunError> {
        let (metrics, outcome) = match self {
            DecisionSource::Rules(strategy) => {
                let signals = strategy.run(series);
                let trace = replay_signals(&signals, &settings.account)?;
                let metrics = PerformanceMetrics::compute(
                    &trace.values,
                    trace.initial_capital,
                    trace.trades.len(),
                    trace.rejected.len(),
                );
                (metrics, RunOutcome::Rules { signals, trace })
            }
            DecisionSource::Agent(policy) => {
                let mut env =
                    DecisionEnvironment::from_series(series, settings.frame, settings.environment)?;
                let episode = evaluate_policy(&mut env, policy.as_mut())?;
                let metrics = PerformanceMetrics::compute(
                    &episode.values,
                    episode.initial_capital,
                    episode.trade_count(),
                    0,
                );
                (metrics, RunOutcome::Agent { episode })
            }
        };

        Ok(RunResult {
            schema_version: SCHEMA_VERSION,
            run_id: None,
            symbol: series.symbol().to_string(),
            source: self.name().to_string(),
            dataset_hash: dataset_hash(series),
            synthetic: false,
            model_digest: None,
            metrics,
            outcome,
        })
    }
}

impl From<Strategy> for DecisionSource {
    fn from(s: Strategy) -> Self {
        DecisionSource::Rules(s)
    }
}

/// Complete result of a single run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub schema_version: u32,
    pub run_id: Option<String>,
    pub symbol: String,
    /// Strategy or policy name.
    pub source: String,
    pub dataset_hash: String,
    pub synthetic: bool,
    /// BLAKE3 digest of the model artifact backing the policy, if any.
    pub model_digest: Option<String>,
    pub metrics: PerformanceMetrics,
    pub outcome: RunOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunOutcome {
    Rules {
        signals: SignalFrame,
        trace: PortfolioTrace,
    },
    Agent {
        episode: EpisodeReport,
    },
}

impl RunResult {
    /// Portfolio values, one per row (rules) or per step (agent).
    pub fn values(&self) -> &[f64] {
        match &self.outcome {
            RunOutcome::Rules { trace, .. } => &trace.values,
            RunOutcome::Agent { episode } => &episode.values,
        }
    }
}
