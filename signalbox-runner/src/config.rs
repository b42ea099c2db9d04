//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! [data]
//! source = "synthetic"
//! symbol = "SYN"
//! length = 500
//!
//! [strategy]
//! type = "mean_reversion"
//! window = 20
//! threshold = 1.5
//!
//! [account]
//! trade_quantity = 1.0
//!
//! [environment]
//! look_back = 50
//!
//! # Optional: evaluate a policy through the decision environment instead
//! # of replaying the strategy's signals.
//! [agent.policy]
//! type = "random"
//! seed = 42
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use signalbox_core::{
    Action, EnvConfig, FrameConfig, HoldPolicy, Policy, RandomPolicy, ScriptedPolicy, Strategy,
    StrategyConfig,
};

use crate::data_loader::DataConfig;
use crate::replay::AccountConfig;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid parameter: {0}")]
    Invalid(#[from] signalbox_core::ConfigError),
}

/// Everything needed to reproduce a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataConfig,

    pub strategy: StrategyConfig,

    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub environment: EnvConfig,

    /// When present the run evaluates this policy instead of the strategy.
    #[serde(default)]
    pub agent: Option<AgentConfig>,
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Fail fast on any parameter the core would reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Strategy::from_config(&self.strategy)?;
        self.account.validate()?;
        self.environment.validate()?;
        Ok(())
    }

    /// Computes a deterministic hash ID for this configuration.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    /// Frame windows for the decision environment's observation columns.
    ///
    /// A trend-following strategy lends its moving-average windows; otherwise
    /// the defaults apply.
    pub fn environment_frame(&self) -> FrameConfig {
        match self.strategy {
            StrategyConfig::TrendFollowing {
                short_window,
                long_window,
            } => FrameConfig::new(FrameConfig::DEFAULT_STAT_WINDOW, short_window, long_window)
                .unwrap_or_default(),
            StrategyConfig::MeanReversion { .. } => FrameConfig::default(),
        }
    }
}

/// Policy selection for agent runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub policy: PolicyConfig,

    /// Trained model file to record by digest alongside the result.
    #[serde(default)]
    pub artifact: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyConfig {
    Hold,
    Random {
        #[serde(default)]
        seed: u64,
    },
    Scripted {
        actions: Vec<Action>,
    },
}

impl PolicyConfig {
    pub fn build(&self) -> Box<dyn Policy> {
        match self {
            PolicyConfig::Hold => Box::new(HoldPolicy),
            PolicyConfig::Random { seed } => Box::new(RandomPolicy::new(*seed)),
            PolicyConfig::Scripted { actions } => Box::new(ScriptedPolicy::new(actions.clone())),
        }
    }
}
