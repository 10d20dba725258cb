// Hyperparameter configuration for a training session
// Validated once at session construction and immutable afterwards

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{McError, McResult};

/// Hyperparameters consumed at training-session start.
///
/// The defaults match the reference configuration: `epsilon = 0.1`,
/// `gamma = 0.9`, `alpha = 0.02`, 50_000 training episodes with a progress
/// report every 1_000. Exploration decay is disabled by default
/// (`epsilon_decay = 1.0`), which keeps the behavior policy's exploration
/// rate fixed for the whole session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Exploration rate (ε) - probability of taking a random action
    pub epsilon: f64,
    /// Discount factor (γ) - importance of future rewards
    pub gamma: f64,
    /// Learning rate (α) - how quickly new returns override old estimates
    pub alpha: f64,
    /// Number of training episodes to run
    pub num_episodes: usize,
    /// Episodes between progress-callback invocations
    pub eval_interval: usize,
    /// Hard ceiling on steps per episode; exceeding it is a protocol error
    pub max_steps_per_episode: usize,
    /// Per-episode multiplicative decay applied to the effective epsilon
    pub epsilon_decay: f64,
    /// Floor the effective epsilon never decays below
    pub min_epsilon: f64,
    /// Optional budget for a single environment call; `None` disables the check
    pub step_timeout: Option<Duration>,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            gamma: 0.9,
            alpha: 0.02,
            num_episodes: 50_000,
            eval_interval: 1_000,
            max_steps_per_episode: 10_000,
            epsilon_decay: 1.0,
            min_epsilon: 0.0,
            step_timeout: None,
        }
    }
}

impl Hyperparameters {
    /// Check every field against its documented domain.
    ///
    /// A zero `num_episodes` is deliberately legal: training with an empty
    /// budget returns an empty table without touching the environment.
    pub fn validate(&self) -> McResult<()> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(McError::invalid_configuration(format!(
                "epsilon must be in [0, 1], got {}",
                self.epsilon
            )));
        }
        if !(0.0..1.0).contains(&self.gamma) {
            return Err(McError::invalid_configuration(format!(
                "gamma must be in [0, 1), got {}",
                self.gamma
            )));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(McError::invalid_configuration(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if self.eval_interval == 0 {
            return Err(McError::invalid_configuration(
                "eval_interval must be positive",
            ));
        }
        if self.max_steps_per_episode == 0 {
            return Err(McError::invalid_configuration(
                "max_steps_per_episode must be positive",
            ));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(McError::invalid_configuration(format!(
                "epsilon_decay must be in (0, 1], got {}",
                self.epsilon_decay
            )));
        }
        if !(0.0..=1.0).contains(&self.min_epsilon) {
            return Err(McError::invalid_configuration(format!(
                "min_epsilon must be in [0, 1], got {}",
                self.min_epsilon
            )));
        }
        Ok(())
    }
}
