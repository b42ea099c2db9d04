//! Decision environment: drives an unguarded account from an external policy.
//!
//! State machine: `Reset` (position 0, capital = initial, step 0) → `Running`
//! (step advances once per action) → `Done` (step > len - look_back).
//!
//! Unlike [`crate::account::TradingAccount`], buys and sells here are
//! unconditional: there is no funds check and selling past zero opens a
//! short. Both accounting paths exist side by side on purpose.
//!
//! Per step:
//! 1. The action executes at `price[step]`.
//! 2. `step` advances; the episode is done once `step > len - look_back`.
//! 3. Reward is `portfolio_value(price[step]) - initial_capital`, the
//!    cumulative P&L rather than a per-step delta.
//! 4. The observation is the `look_back x 4` window starting at the new step.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{
    require_capital, require_fee_rate, require_window, ConfigError, DEFAULT_FEE_RATE,
    DEFAULT_INITIAL_CAPITAL,
};
use crate::domain::PriceSeries;
use crate::indicators::{FrameConfig, IndicatorFrame};

/// Number of features per observation row: price, volume, short MA, long MA.
pub const OBSERVATION_FEATURES: usize = 4;

/// Discrete action space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy = 0,
    Sell = 1,
    Hold = 2,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Buy, Action::Sell, Action::Hold];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for Action {
    type Error = EnvError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Action::ALL
            .get(value)
            .copied()
            .ok_or(EnvError::InvalidAction(value))
    }
}

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("series has {len} rows, fewer than look_back={look_back}")]
    SeriesTooShort { len: usize, look_back: usize },

    #[error("action index {0} is outside the action space (0=buy, 1=sell, 2=hold)")]
    InvalidAction(usize),

    #[error("episode is done; call reset() before stepping again")]
    EpisodeDone,
}

/// Environment settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    #[serde(default = "default_capital")]
    pub initial_capital: f64,
    #[serde(default = "default_fee_rate")]
    pub fee_rate: f64,
    #[serde(default = "default_look_back")]
    pub look_back: usize,
}

fn default_capital() -> f64 {
    DEFAULT_INITIAL_CAPITAL
}

fn default_fee_rate() -> f64 {
    DEFAULT_FEE_RATE
}

fn default_look_back() -> usize {
    EnvConfig::DEFAULT_LOOK_BACK
}

impl EnvConfig {
    pub const DEFAULT_LOOK_BACK: usize = 50;

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_capital(self.initial_capital)?;
        require_fee_rate(self.fee_rate)?;
        require_window("look_back", self.look_back)?;
        Ok(())
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            fee_rate: DEFAULT_FEE_RATE,
            look_back: Self::DEFAULT_LOOK_BACK,
        }
    }
}

/// Fixed-shape `look_back x 4` block of (price, volume, short_mavg, long_mavg).
///
/// Rows past the end of the series, which only occur in the terminal
/// observation, are zero-filled so the shape never changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationWindow {
    rows: Vec<[f64; OBSERVATION_FEATURES]>,
}

impl ObservationWindow {
    pub fn rows(&self) -> &[[f64; OBSERVATION_FEATURES]] {
        &self.rows
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), OBSERVATION_FEATURES)
    }

    /// Row-major flattening, for policies that consume a flat vector.
    pub fn to_flat(&self) -> Vec<f64> {
        self.rows.iter().flatten().copied().collect()
    }

    /// Price of the first row in the window.
    pub fn current_price(&self) -> f64 {
        self.rows.first().map_or(0.0, |r| r[0])
    }
}

/// Result of one `step`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub observation: ObservationWindow,
    pub reward: f64,
    pub done: bool,
    /// Always empty; kept for protocol parity with gym-style hosts.
    pub info: HashMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EpisodeState {
    Reset,
    Running,
    Done,
}

#[derive(Debug, Clone)]
pub struct DecisionEnvironment {
    frame: IndicatorFrame,
    config: EnvConfig,
    step: usize,
    capital: f64,
    position: f64,
    state: EpisodeState,
}

impl DecisionEnvironment {
    pub fn new(frame: IndicatorFrame, config: EnvConfig) -> Result<Self, EnvError> {
        config.validate()?;
        if frame.len() < config.look_back {
            return Err(EnvError::SeriesTooShort {
                len: frame.len(),
                look_back: config.look_back,
            });
        }
        Ok(Self {
            frame,
            config,
            step: 0,
            capital: config.initial_capital,
            position: 0.0,
            state: EpisodeState::Reset,
        })
    }

    /// Compute the indicator frame for `series` and wrap it.
    pub fn from_series(
        series: &PriceSeries,
        frame_config: FrameConfig,
        config: EnvConfig,
    ) -> Result<Self, EnvError> {
        Self::new(IndicatorFrame::compute(series, frame_config), config)
    }

    pub fn reset(&mut self) -> ObservationWindow {
        self.step = 0;
        self.capital = self.config.initial_capital;
        self.position = 0.0;
        self.state = EpisodeState::Reset;
        self.observation()
    }

    pub fn step(&mut self, action: Action) -> Result<StepOutcome, EnvError> {
        if self.state == EpisodeState::Done {
            return Err(EnvError::EpisodeDone);
        }

        let price = self.price_at(self.step);
        let fee = self.config.fee_rate;
        match action {
            Action::Buy => {
                self.position += 1.0;
                self.capital -= price * (1.0 + fee);
            }
            Action::Sell => {
                self.position -= 1.0;
                self.capital += price * (1.0 - fee);
            }
            Action::Hold => {}
        }

        self.step += 1;
        self.state = if self.step > self.last_start() {
            EpisodeState::Done
        } else {
            EpisodeState::Running
        };

        let reward = self.portfolio_value(self.price_at(self.step)) - self.config.initial_capital;
        Ok(StepOutcome {
            observation: self.observation(),
            reward,
            done: self.state == EpisodeState::Done,
            info: HashMap::new(),
        })
    }

    /// Convenience for hosts that speak raw action indices.
    pub fn step_index(&mut self, action: usize) -> Result<StepOutcome, EnvError> {
        self.step(Action::try_from(action)?)
    }

    pub fn portfolio_value(&self, current_price: f64) -> f64 {
        self.capital + self.position * current_price
    }

    /// Mark price at the current step.
    pub fn current_price(&self) -> f64 {
        self.price_at(self.step)
    }

    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == EpisodeState::Done
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn frame(&self) -> &IndicatorFrame {
        &self.frame
    }

    /// Largest step whose window still fits inside the series.
    fn last_start(&self) -> usize {
        self.frame.len() - self.config.look_back
    }

    fn price_at(&self, index: usize) -> f64 {
        let rows = self.frame.rows();
        rows.get(index)
            .or_else(|| rows.last())
            .map_or(0.0, |r| r.price)
    }

    fn observation(&self) -> ObservationWindow {
        let rows = (self.step..self.step + self.config.look_back)
            .map(|i| match self.frame.get(i) {
                Some(r) => [r.price, r.volume, r.short_mavg, r.long_mavg],
                None => [0.0; OBSERVATION_FEATURES],
            })
            .collect();
        ObservationWindow { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series};

    fn env_over(prices: &[f64], look_back: usize) -> DecisionEnvironment {
        let config = EnvConfig {
            initial_capital: 10_000.0,
            fee_rate: 0.001,
            look_back,
        };
        DecisionEnvironment::from_series(
            &make_series(prices),
            FrameConfig::new(2, 2, 3).unwrap(),
            config,
        )
        .unwrap()
    }

    #[test]
    fn buy_at_fifty_matches_expected_accounting() {
        let mut env = env_over(&[50.0; 10], 3);
        env.reset();
        let outcome = env.step(Action::Buy).unwrap();
        assert_approx(env.capital(), 9_949.95, 1e-9);
        assert_eq!(env.position(), 1.0);
        assert_approx(outcome.reward, -0.05, 1e-9);
        assert!(!outcome.done);
        assert!(outcome.info.is_empty());
    }

    #[test]
    fn buy_is_unconditional() {
        let config = EnvConfig {
            initial_capital: 10.0,
            fee_rate: 0.0,
            look_back: 2,
        };
        let mut env = DecisionEnvironment::from_series(
            &make_series(&[100.0; 6]),
            FrameConfig::default(),
            config,
        )
        .unwrap();
        env.reset();
        env.step(Action::Buy).unwrap();
        assert_eq!(env.capital(), -90.0);
        assert_eq!(env.position(), 1.0);
    }

    #[test]
    fn sell_opens_short() {
        let mut env = env_over(&[20.0; 8], 2);
        env.reset();
        env.step(Action::Sell).unwrap();
        env.step(Action::Sell).unwrap();
        assert_eq!(env.position(), -2.0);
        assert_approx(env.capital(), 10_000.0 + 2.0 * 20.0 * 0.999, 1e-9);
    }

    #[test]
    fn hold_only_advances_step() {
        let mut env = env_over(&[20.0; 8], 2);
        env.reset();
        let outcome = env.step(Action::Hold).unwrap();
        assert_eq!(env.current_step(), 1);
        assert_eq!(env.capital(), 10_000.0);
        assert_eq!(outcome.reward, 0.0);
        assert_eq!(env.state(), EpisodeState::Running);
    }

    #[test]
    fn done_exactly_after_last_window() {
        // len 10, look_back 3 → done once step > 7.
        let mut env = env_over(&[1.0; 10], 3);
        env.reset();
        for _ in 0..7 {
            assert!(!env.step(Action::Hold).unwrap().done);
        }
        let last = env.step(Action::Hold).unwrap();
        assert!(last.done);
        assert_eq!(env.current_step(), 8);
        assert!(matches!(env.step(Action::Hold), Err(EnvError::EpisodeDone)));
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut env = env_over(&[5.0; 6], 2);
        env.reset();
        env.step(Action::Buy).unwrap();
        let obs = env.reset();
        assert_eq!(env.state(), EpisodeState::Reset);
        assert_eq!(env.capital(), 10_000.0);
        assert_eq!(env.position(), 0.0);
        assert_eq!(obs.shape(), (2, 4));
    }

    #[test]
    fn observation_is_sliding_window() {
        let mut env = env_over(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        let obs = env.reset();
        assert_eq!(obs.rows()[0][0], 1.0);
        assert_eq!(obs.rows()[2][0], 3.0);
        assert_eq!(obs.rows()[0][1], 1000.0);
        let next = env.step(Action::Hold).unwrap().observation;
        assert_eq!(next.rows()[0][0], 2.0);
        assert_eq!(next.current_price(), 2.0);
        // short MA (window 2) at row 2 = mean(2, 3)
        assert_eq!(next.rows()[1][2], 2.5);
        assert_eq!(next.to_flat().len(), 12);
    }

    #[test]
    fn terminal_observation_keeps_shape() {
        let mut env = env_over(&[1.0, 2.0, 3.0, 4.0], 3);
        env.reset();
        env.step(Action::Hold).unwrap();
        let last = env.step(Action::Hold).unwrap();
        assert!(last.done);
        assert_eq!(last.observation.shape(), (3, 4));
        assert_eq!(last.observation.rows()[2], [0.0; 4]);
    }

    #[test]
    fn look_back_one_marks_at_last_price() {
        let mut env = env_over(&[10.0, 11.0, 12.0], 1);
        env.reset();
        env.step(Action::Buy).unwrap();
        env.step(Action::Hold).unwrap();
        let last = env.step(Action::Hold).unwrap();
        assert!(last.done);
        assert_eq!(env.current_price(), 12.0);
    }

    #[test]
    fn rejects_short_series_and_bad_config() {
        let frame = IndicatorFrame::compute(&make_series(&[1.0, 2.0]), FrameConfig::default());
        assert!(matches!(
            DecisionEnvironment::new(frame.clone(), EnvConfig::default()),
            Err(EnvError::SeriesTooShort { len: 2, look_back: 50 })
        ));
        let bad = EnvConfig {
            look_back: 0,
            ..EnvConfig::default()
        };
        assert!(matches!(
            DecisionEnvironment::new(frame, bad),
            Err(EnvError::Config(_))
        ));
    }

    #[test]
    fn action_indices() {
        assert_eq!(Action::try_from(0).unwrap(), Action::Buy);
        assert_eq!(Action::try_from(1).unwrap(), Action::Sell);
        assert_eq!(Action::try_from(2).unwrap(), Action::Hold);
        assert!(matches!(Action::try_from(3), Err(EnvError::InvalidAction(3))));
        assert_eq!(Action::Hold.index(), 2);
    }
}
