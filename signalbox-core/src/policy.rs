//! Policies: opaque observation → action capabilities that drive the
//! decision environment.
//!
//! Learning algorithms live outside this crate. A trained model only shows up
//! here as a [`ModelArtifact`] handle; hosts wrap their inference in a type
//! implementing [`Policy`].

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::environment::{Action, ObservationWindow};

pub trait Policy: Send {
    /// Human-readable name (e.g., "random", "hold").
    fn name(&self) -> &str;

    /// Choose the next action for `observation`.
    fn predict(&mut self, observation: &ObservationWindow) -> Action;
}

/// Baseline that never trades.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldPolicy;

impl Policy for HoldPolicy {
    fn name(&self) -> &str {
        "hold"
    }

    fn predict(&mut self, _observation: &ObservationWindow) -> Action {
        Action::Hold
    }
}

/// Uniform random actions from a seeded RNG. Same seed, same episode.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    seed: u64,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn predict(&mut self, _observation: &ObservationWindow) -> Action {
        Action::ALL[self.rng.gen_range(0..Action::ALL.len())]
    }
}

/// Replays a fixed action script, then holds.
#[derive(Debug, Clone)]
pub struct ScriptedPolicy {
    actions: Vec<Action>,
    cursor: usize,
}

impl ScriptedPolicy {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions, cursor: 0 }
    }
}

impl Policy for ScriptedPolicy {
    fn name(&self) -> &str {
        "scripted"
    }

    fn predict(&mut self, _observation: &ObservationWindow) -> Action {
        let action = self.actions.get(self.cursor).copied().unwrap_or(Action::Hold);
        self.cursor += 1;
        action
    }
}

/// Opaque handle to a trained model persisted by an external trainer.
///
/// Only the location and a BLAKE3 content digest are known here; the digest
/// lets run records name exactly which model produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelArtifact {
    path: PathBuf,
    digest: String,
}

impl ModelArtifact {
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let bytes = std::fs::read(&path)?;
        Ok(Self {
            digest: blake3::hash(&bytes).to_hex().to_string(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}
