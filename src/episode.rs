// Episode generation: drive one full trajectory against the environment
// Hardened with a step ceiling and an optional per-call time budget

use rand::Rng;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::env::{Environment, Step};
use crate::error::{McError, McResult};
use crate::policy::select_action;
use crate::table::ActionValueTable;

/// One (state, action, reward) triple of a trajectory
#[derive(Debug, Clone, PartialEq)]
pub struct TimeStep<S> {
    /// State the action was taken from
    pub state: S,
    /// Action index taken
    pub action: usize,
    /// Reward observed for the transition
    pub reward: f64,
}

/// An ordered record of one complete episode.
///
/// Built by `run_episode`, consumed exactly once by the return engine, then
/// dropped. Never retained across episodes.
#[derive(Debug, Clone)]
pub struct Trajectory<S> {
    steps: Vec<TimeStep<S>>,
}

impl<S> Trajectory<S> {
    /// Assemble a trajectory from already-ordered steps
    pub(crate) fn from_steps(steps: Vec<TimeStep<S>>) -> Self {
        Self { steps }
    }

    /// Steps in chronological order
    pub fn steps(&self) -> &[TimeStep<S>] {
        &self.steps
    }

    /// Number of steps taken in the episode
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the episode terminated on its very first reset (no steps)
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Reward observed on the terminating step, the evaluator's scoring input
    pub fn final_reward(&self) -> Option<f64> {
        self.steps.last().map(|step| step.reward)
    }

    /// Sum of undiscounted rewards, used for training statistics only
    pub fn total_reward(&self) -> f64 {
        self.steps.iter().map(|step| step.reward).sum()
    }
}

/// Safety limits applied to every generated episode
#[derive(Debug, Clone, Copy)]
pub struct EpisodeLimits {
    /// Hard ceiling on steps before the episode is declared malformed
    pub max_steps: usize,
    /// Optional budget for each individual `reset`/`step` call
    pub step_timeout: Option<Duration>,
}

impl EpisodeLimits {
    pub(crate) fn check_elapsed(&self, started: Instant, call: &str) -> McResult<()> {
        if let Some(budget) = self.step_timeout {
            let elapsed = started.elapsed();
            if elapsed > budget {
                return Err(McError::environment_protocol(format!(
                    "environment {} took {:?}, over the {:?} budget",
                    call, elapsed, budget
                )));
            }
        }
        Ok(())
    }
}

/// Generate one full trajectory under the epsilon-greedy policy.
///
/// Resets the environment, then repeatedly selects an action against the
/// current table, advances one step, and records the pre-step state with the
/// action taken and the reward observed, until the environment reports
/// completion. An environment that fails during `reset`/`step`, exceeds the
/// per-call time budget, or never signals completion within `max_steps` is a
/// protocol violation and fails the episode.
pub fn run_episode<E, R>(
    env: &mut E,
    table: &mut ActionValueTable<E::State>,
    epsilon: f64,
    rng: &mut R,
    limits: EpisodeLimits,
) -> McResult<Trajectory<E::State>>
where
    E: Environment,
    E::State: Clone + Eq + Hash + Debug,
    R: Rng,
{
    let reset_started = Instant::now();
    let mut state = env
        .reset()
        .map_err(|e| McError::environment_protocol(format!("reset failed: {e:#}")))?;
    limits.check_elapsed(reset_started, "reset")?;

    let mut trajectory = Trajectory { steps: Vec::new() };

    loop {
        if trajectory.len() >= limits.max_steps {
            return Err(McError::environment_protocol(format!(
                "episode exceeded the step ceiling of {} without terminating",
                limits.max_steps
            )));
        }

        let action = select_action(table, &state, epsilon, rng);

        let step_started = Instant::now();
        let Step {
            next_state,
            reward,
            done,
            info,
        } = env
            .step(action)
            .map_err(|e| McError::environment_protocol(format!("step failed: {e:#}")))?;
        limits.check_elapsed(step_started, "step")?;

        if let Some(info) = info {
            debug!(step = trajectory.len(), %info, "environment diagnostics");
        }

        trajectory.steps.push(TimeStep {
            state,
            action,
            reward,
        });
        state = next_state;

        if done {
            return Ok(trajectory);
        }
    }
}
