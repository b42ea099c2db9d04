//! Run orchestration: wires config, data loading, decision source, and metrics.
//!
//! Two entry points:
//! - `run_from_config()`: loads the configured series, then runs. Used by the CLI.
//! - `run_on_series()`: takes a pre-loaded series. Used by batch runs and tests.

use std::path::PathBuf;

use thiserror::Error;

use signalbox_core::data::DataError;
use signalbox_core::{EnvError, ModelArtifact, PriceSeries, Strategy};

use crate::config::{ConfigError, RunConfig};
use crate::data_loader::load_series;
use crate::source::{DecisionSource, RunResult, RunSettings};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid parameter: {0}")]
    Params(#[from] signalbox_core::ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("environment error: {0}")]
    Environment(#[from] EnvError),
    #[error("failed to open model artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RunConfig {
    /// Account, environment, and observation-frame settings for this run.
    pub fn settings(&self) -> RunSettings {
        RunSettings {
            account: self.account,
            environment: self.environment,
            frame: self.environment_frame(),
        }
    }

    /// The agent's policy when configured, otherwise the strategy.
    pub fn decision_source(&self) -> Result<DecisionSource, signalbox_core::ConfigError> {
        Ok(match &self.agent {
            Some(agent) => DecisionSource::Agent(agent.policy.build()),
            None => DecisionSource::Rules(Strategy::from_config(&self.strategy)?),
        })
    }
}

pub fn run_from_config(config: &RunConfig) -> Result<RunResult, RunError> {
    let series = load_series(&config.data)?;
    let mut result = run_on_series(config, &series)?;
    result.synthetic = config.data.is_synthetic();
    Ok(result)
}

pub fn run_on_series(config: &RunConfig, series: &PriceSeries) -> Result<RunResult, RunError> {
    let run_id = config.run_id();
    let span = tracing::info_span!("run", run_id = %&run_id[..12], symbol = series.symbol());
    let _guard = span.enter();

    let model_digest = match config.agent.as_ref().and_then(|a| a.artifact.as_ref()) {
        Some(path) => {
            let artifact = ModelArtifact::open(path).map_err(|source| RunError::Artifact {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), digest = artifact.digest(), "model artifact");
            Some(artifact.digest().to_string())
        }
        None => None,
    };

    let mut source = config.decision_source()?;
    let mut result = source.run(series, &config.settings())?;
    result.run_id = Some(run_id);
    result.model_digest = model_digest;

    tracing::info!(
        source = %result.source,
        final_value = result.metrics.final_value,
        total_return = result.metrics.total_return,
        "run complete"
    );
    Ok(result)
}
