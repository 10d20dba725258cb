// Environment collaborator contract
// The engine drives any simulator that satisfies these four operations

use rand::Rng;
use std::fmt::Debug;
use std::hash::Hash;

/// Result of advancing the environment by one action.
///
/// `done` is a normal control signal, not an error: it is `true` exactly
/// once, on the step that ends the episode. `info` is an opaque diagnostic
/// payload that the engine logs but never consumes.
#[derive(Debug, Clone)]
pub struct Step<S> {
    /// State the environment transitioned into
    pub next_state: S,
    /// Reward for the transition taken
    pub reward: f64,
    /// Whether this step ended the episode
    pub done: bool,
    /// Opaque diagnostic payload from the simulator
    pub info: Option<serde_json::Value>,
}

impl<S> Step<S> {
    /// Convenience constructor for simulators that carry no diagnostics
    pub fn new(next_state: S, reward: f64, done: bool) -> Self {
        Self {
            next_state,
            reward,
            done,
            info: None,
        }
    }
}

/// Capability interface for the external simulator.
///
/// States are opaque to the engine: nothing beyond equality, hashing, and
/// cloning is ever assumed. Actions are indices in `[0, action_count)`.
/// `reset` and `step` return `anyhow::Result` because a collaborator can
/// fail for reasons the engine cannot enumerate; any such failure is fatal
/// to the training session (see `McError::EnvironmentProtocol`).
pub trait Environment {
    type State: Clone + Eq + Hash + Debug;

    /// Begin a new, independent episode and return its initial state
    fn reset(&mut self) -> anyhow::Result<Self::State>;

    /// Advance one step; `action` must be a valid index in `[0, action_count)`
    fn step(&mut self, action: usize) -> anyhow::Result<Step<Self::State>>;

    /// Size of the action space, fixed for the lifetime of the instance
    fn action_count(&self) -> usize;

    /// Draw a uniformly random valid action.
    ///
    /// Used by pure exploration and by the evaluator's fallback for states
    /// the learned policy has never seen. The default draws uniformly over
    /// the action index range; override only if the simulator's sampling is
    /// non-uniform or externally sourced.
    fn sample_action(&mut self, rng: &mut dyn rand::RngCore) -> usize {
        rng.random_range(0..self.action_count())
    }
}
