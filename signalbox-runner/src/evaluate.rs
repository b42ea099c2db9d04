//! Policy evaluation through the decision environment.
//!
//! One episode: reset, then predict/step until the environment reports done
//! or `len(series)` steps have been taken.

use serde::{Deserialize, Serialize};

use signalbox_core::{Action, DecisionEnvironment, EnvError, Policy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeReport {
    pub policy: String,
    pub steps: usize,
    pub actions: Vec<Action>,
    pub rewards: Vec<f64>,
    /// Portfolio value after each step.
    pub values: Vec<f64>,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub final_position: f64,
    pub done: bool,
}

impl EpisodeReport {
    pub fn final_reward(&self) -> f64 {
        self.rewards.last().copied().unwrap_or(0.0)
    }

    pub fn final_value(&self) -> f64 {
        self.values.last().copied().unwrap_or(self.initial_capital)
    }

    /// Buy and sell actions; holds are not trades.
    pub fn trade_count(&self) -> usize {
        self.actions.iter().filter(|a| **a != Action::Hold).count()
    }

    pub fn action_count(&self, action: Action) -> usize {
        self.actions.iter().filter(|a| **a == action).count()
    }
}

pub fn evaluate_policy(
    env: &mut DecisionEnvironment,
    policy: &mut dyn Policy,
) -> Result<EpisodeReport, EnvError> {
    let initial_capital = env.config().initial_capital;
    let max_steps = env.frame().len();

    let mut actions = Vec::new();
    let mut rewards = Vec::new();
    let mut values = Vec::new();
    let mut done = false;

    let mut observation = env.reset();
    for _ in 0..max_steps {
        let action = policy.predict(&observation);
        let outcome = env.step(action)?;

        actions.push(action);
        rewards.push(outcome.reward);
        values.push(initial_capital + outcome.reward);
        observation = outcome.observation;

        if outcome.done {
            done = true;
            break;
        }
    }

    tracing::info!(
        policy = policy.name(),
        steps = actions.len(),
        final_reward = rewards.last().copied().unwrap_or(0.0),
        "episode complete"
    );

    Ok(EpisodeReport {
        policy: policy.name().to_string(),
        steps: actions.len(),
        actions,
        rewards,
        values,
        initial_capital,
        final_capital: env.capital(),
        final_position: env.position(),
        done,
    })
}
