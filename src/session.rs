// Training session: owns the environment, hyperparameters, and table
// One episode is generated and fully applied before the next begins

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Hyperparameters;
use crate::env::Environment;
use crate::episode::{run_episode, EpisodeLimits};
use crate::error::{McError, McResult};
use crate::policy::GreedyPolicy;
use crate::returns::apply_returns;
use crate::stats::TrainingStats;
use crate::table::ActionValueTable;

/// Immutable view of training progress handed to the periodic callback.
///
/// The callback observes; it cannot alter the table.
#[derive(Debug)]
pub struct Progress<'a, S> {
    /// Number of episodes completed so far (1-based at the first callback)
    pub episode: usize,
    /// The table as of the last completed episode
    pub table: &'a ActionValueTable<S>,
    /// Rolling training statistics
    pub stats: &'a TrainingStats,
    /// Effective exploration rate currently driving the behavior policy
    pub epsilon: f64,
}

/// An on-policy Monte Carlo control session over one environment.
///
/// Construction validates the hyperparameters up front; after that the
/// session runs episode generation and table updates strictly in sequence:
/// the behavior policy for each episode reads the table as improved by all
/// previous episodes. The table stays available on the session after
/// training, including after a fatal environment error, in which case it
/// reflects the last successfully completed episode.
pub struct TrainingSession<E: Environment> {
    env: E,
    params: Hyperparameters,
    table: ActionValueTable<E::State>,
    stats: TrainingStats,
    stop: Arc<AtomicBool>,
    rng: StdRng,
    effective_epsilon: f64,
}

impl<E: Environment> std::fmt::Debug for TrainingSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainingSession")
            .field("params", &self.params)
            .field("stats", &self.stats)
            .field("effective_epsilon", &self.effective_epsilon)
            .finish_non_exhaustive()
    }
}

impl<E: Environment> TrainingSession<E> {
    /// Create a session with an OS-seeded random source
    pub fn new(env: E, params: Hyperparameters) -> McResult<Self> {
        Self::with_rng(env, params, StdRng::from_os_rng())
    }

    /// Create a session with a fixed seed for reproducible runs
    pub fn with_seed(env: E, params: Hyperparameters, seed: u64) -> McResult<Self> {
        Self::with_rng(env, params, StdRng::seed_from_u64(seed))
    }

    fn with_rng(env: E, params: Hyperparameters, rng: StdRng) -> McResult<Self> {
        params.validate()?;
        let action_count = env.action_count();
        if action_count == 0 {
            return Err(McError::invalid_configuration(
                "environment reports an empty action space",
            ));
        }
        let effective_epsilon = params.epsilon;
        let window = params.eval_interval;
        Ok(Self {
            env,
            params,
            table: ActionValueTable::new(action_count),
            stats: TrainingStats::new(window),
            stop: Arc::new(AtomicBool::new(false)),
            rng,
            effective_epsilon,
        })
    }

    /// Handle the host can set to request a clean abort.
    ///
    /// The flag is checked between episodes only: the in-flight episode
    /// always completes and its updates are fully applied before the loop
    /// stops, so the table is never left mid-update.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// The action-value table in its current state
    pub fn table(&self) -> &ActionValueTable<E::State> {
        &self.table
    }

    /// Rolling statistics for the session so far
    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    /// Run the configured episode budget without a progress callback
    pub fn train(&mut self) -> McResult<&ActionValueTable<E::State>> {
        self.train_with_progress(|_| {})
    }

    /// Run the configured episode budget, reporting every `eval_interval`
    /// episodes.
    ///
    /// Each iteration generates one trajectory under the epsilon-greedy
    /// policy reading the current table, then folds its returns back into
    /// the same table. No convergence check is performed; the loop runs the
    /// full budget unless the stop handle is set or the environment violates
    /// its protocol. A protocol violation aborts the whole session, since a
    /// corrupted trajectory must never be partially applied; the table as of
    /// the last completed episode remains readable through [`Self::table`].
    pub fn train_with_progress<F>(
        &mut self,
        mut callback: F,
    ) -> McResult<&ActionValueTable<E::State>>
    where
        F: for<'a> FnMut(Progress<'a, E::State>),
    {
        let limits = EpisodeLimits {
            max_steps: self.params.max_steps_per_episode,
            step_timeout: self.params.step_timeout,
        };
        let started = Instant::now();
        info!(
            episodes = self.params.num_episodes,
            epsilon = self.params.epsilon,
            gamma = self.params.gamma,
            alpha = self.params.alpha,
            "starting training session"
        );

        for episode in 0..self.params.num_episodes {
            if self.stop.load(Ordering::Relaxed) {
                warn!(completed = episode, "stop requested, aborting between episodes");
                break;
            }

            let trajectory = run_episode(
                &mut self.env,
                &mut self.table,
                self.effective_epsilon,
                &mut self.rng,
                limits,
            )?;
            apply_returns(
                &trajectory,
                &mut self.table,
                self.params.gamma,
                self.params.alpha,
            );
            self.stats
                .record_episode(trajectory.total_reward(), trajectory.len());

            self.effective_epsilon = (self.effective_epsilon * self.params.epsilon_decay)
                .max(self.params.min_epsilon);

            let completed = episode + 1;
            if completed % self.params.eval_interval == 0 {
                info!(
                    episode = completed,
                    mean_return = self.stats.mean_return(),
                    states = self.table.len(),
                    "training progress"
                );
                callback(Progress {
                    episode: completed,
                    table: &self.table,
                    stats: &self.stats,
                    epsilon: self.effective_epsilon,
                });
            }
        }

        debug!(
            elapsed = ?started.elapsed(),
            episodes = self.stats.total_episodes(),
            steps = self.stats.total_steps(),
            "training session finished"
        );
        Ok(&self.table)
    }

    /// Freeze a deterministic policy from the current table
    pub fn extract(&self) -> GreedyPolicy<E::State> {
        GreedyPolicy::extract(&self.table)
    }

    /// Measure a frozen policy's success rate over held-out episodes.
    ///
    /// Runs `num_episodes` complete episodes under the deterministic policy,
    /// drawing a fallback action from the environment's sampler for states
    /// the policy has never seen. A win is a strictly positive reward on the
    /// terminating step of that evaluation episode (the final reward, not
    /// the cumulative return). Returns `wins / num_episodes`.
    pub fn evaluate(
        &mut self,
        policy: &GreedyPolicy<E::State>,
        num_episodes: usize,
    ) -> McResult<f64> {
        if num_episodes == 0 {
            return Err(McError::invalid_configuration(
                "evaluation episode count must be positive",
            ));
        }
        let limits = EpisodeLimits {
            max_steps: self.params.max_steps_per_episode,
            step_timeout: self.params.step_timeout,
        };

        let mut wins = 0usize;
        for _ in 0..num_episodes {
            let final_reward = self.run_policy_episode(policy, limits)?;
            if final_reward > 0.0 {
                wins += 1;
            }
        }
        let win_rate = wins as f64 / num_episodes as f64;
        info!(num_episodes, win_rate, "evaluation complete");
        Ok(win_rate)
    }

    /// One full episode under the frozen policy; returns the final reward
    fn run_policy_episode(
        &mut self,
        policy: &GreedyPolicy<E::State>,
        limits: EpisodeLimits,
    ) -> McResult<f64> {
        let reset_started = Instant::now();
        let mut state = self
            .env
            .reset()
            .map_err(|e| McError::environment_protocol(format!("reset failed: {e:#}")))?;
        limits.check_elapsed(reset_started, "reset")?;

        let mut steps = 0usize;
        loop {
            if steps >= limits.max_steps {
                return Err(McError::environment_protocol(format!(
                    "evaluation episode exceeded the step ceiling of {}",
                    limits.max_steps
                )));
            }
            let action = match policy.action(&state) {
                Some(action) => action,
                None => self.env.sample_action(&mut self.rng),
            };
            let step_started = Instant::now();
            let step = self
                .env
                .step(action)
                .map_err(|e| McError::environment_protocol(format!("step failed: {e:#}")))?;
            limits.check_elapsed(step_started, "step")?;
            steps += 1;
            state = step.next_state;
            if step.done {
                return Ok(step.reward);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Environment, Step};

    /// Two-armed bandit: arm 0 pays 1.0, arm 1 pays nothing
    struct Bandit {
        resets: usize,
    }

    impl Environment for Bandit {
        type State = u32;

        fn reset(&mut self) -> anyhow::Result<u32> {
            self.resets += 1;
            Ok(0)
        }

        fn step(&mut self, action: usize) -> anyhow::Result<Step<u32>> {
            let reward = if action == 0 { 1.0 } else { 0.0 };
            Ok(Step::new(0, reward, true))
        }

        fn action_count(&self) -> usize {
            2
        }
    }

    /// Three-step episodes with negative intermediate rewards and a +1 finish
    struct UphillFinish {
        position: u32,
    }

    impl Environment for UphillFinish {
        type State = u32;

        fn reset(&mut self) -> anyhow::Result<u32> {
            self.position = 0;
            Ok(0)
        }

        fn step(&mut self, _action: usize) -> anyhow::Result<Step<u32>> {
            self.position += 1;
            if self.position >= 3 {
                Ok(Step::new(self.position, 1.0, true))
            } else {
                Ok(Step::new(self.position, -5.0, false))
            }
        }

        fn action_count(&self) -> usize {
            2
        }
    }

    /// Every episode starts in a state never visited before
    struct Drifting {
        episode: u32,
    }

    impl Environment for Drifting {
        type State = u32;

        fn reset(&mut self) -> anyhow::Result<u32> {
            self.episode += 1;
            Ok(self.episode * 100)
        }

        fn step(&mut self, _action: usize) -> anyhow::Result<Step<u32>> {
            Ok(Step::new(self.episode * 100 + 1, 1.0, true))
        }

        fn action_count(&self) -> usize {
            3
        }
    }

    /// Terminates normally for `good_episodes` episodes, then never again
    struct GoesBad {
        episodes_started: usize,
        good_episodes: usize,
    }

    impl Environment for GoesBad {
        type State = u32;

        fn reset(&mut self) -> anyhow::Result<u32> {
            self.episodes_started += 1;
            Ok(0)
        }

        fn step(&mut self, _action: usize) -> anyhow::Result<Step<u32>> {
            let done = self.episodes_started <= self.good_episodes;
            Ok(Step::new(1, 1.0, done))
        }

        fn action_count(&self) -> usize {
            2
        }
    }

    fn short_params(num_episodes: usize) -> Hyperparameters {
        Hyperparameters {
            num_episodes,
            eval_interval: 100,
            max_steps_per_episode: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_hyperparameters_fail_at_construction() {
        let params = Hyperparameters {
            alpha: -0.5,
            ..Default::default()
        };
        let err = TrainingSession::new(Bandit { resets: 0 }, params).unwrap_err();
        assert!(matches!(err, McError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_bandit_converges_to_paying_arm() {
        let params = Hyperparameters {
            epsilon: 0.1,
            alpha: 0.05,
            gamma: 0.9,
            num_episodes: 2_000,
            eval_interval: 500,
            max_steps_per_episode: 10,
            ..Default::default()
        };
        let mut session = TrainingSession::with_seed(Bandit { resets: 0 }, params, 17).unwrap();
        session.train().unwrap();

        let policy = session.extract();
        assert_eq!(policy.action(&0), Some(0));

        let values = session.table().peek(&0).unwrap();
        assert!(values[0] > values[1]);
        assert!(values[0] > 0.9, "arm 0 estimate should approach 1.0");
    }

    #[test]
    fn test_zero_budget_returns_empty_table_without_touching_env() {
        let mut session =
            TrainingSession::with_seed(Bandit { resets: 0 }, short_params(0), 1).unwrap();
        session.train().unwrap();
        assert!(session.table().is_empty());
        assert_eq!(session.env.resets, 0);
    }

    #[test]
    fn test_win_is_scored_on_the_final_step_only() {
        // Intermediate rewards are strongly negative; only the terminating
        // step's +1 may count.
        let mut session =
            TrainingSession::with_seed(UphillFinish { position: 0 }, short_params(10), 3).unwrap();
        session.train().unwrap();
        let policy = session.extract();
        let win_rate = session.evaluate(&policy, 50).unwrap();
        assert_eq!(win_rate, 1.0);
    }

    #[test]
    fn test_evaluation_falls_back_on_unseen_states() {
        // Every evaluation episode starts in a state training never saw, so
        // the policy has no entry and the environment's sampler must cover.
        let mut session =
            TrainingSession::with_seed(Drifting { episode: 0 }, short_params(5), 9).unwrap();
        session.train().unwrap();
        let policy = session.extract();
        let win_rate = session.evaluate(&policy, 20).unwrap();
        assert_eq!(win_rate, 1.0);
    }

    #[test]
    fn test_zero_evaluation_episodes_is_rejected() {
        let mut session =
            TrainingSession::with_seed(Bandit { resets: 0 }, short_params(1), 2).unwrap();
        session.train().unwrap();
        let policy = session.extract();
        assert!(session.evaluate(&policy, 0).is_err());
    }

    #[test]
    fn test_protocol_error_keeps_partial_table() {
        let env = GoesBad {
            episodes_started: 0,
            good_episodes: 3,
        };
        let params = Hyperparameters {
            num_episodes: 10,
            eval_interval: 1,
            max_steps_per_episode: 20,
            ..Default::default()
        };
        let mut session = TrainingSession::with_seed(env, params, 4).unwrap();

        let err = session.train().unwrap_err();
        assert!(err.is_environment_error());

        // Three episodes completed before the environment went silent; their
        // updates are all present and no partial episode was applied.
        assert_eq!(session.stats().total_episodes(), 3);
        assert!(!session.table().is_empty());
    }

    #[test]
    fn test_stop_handle_aborts_between_episodes() {
        let params = Hyperparameters {
            num_episodes: 1_000,
            eval_interval: 5,
            max_steps_per_episode: 10,
            ..Default::default()
        };
        let mut session = TrainingSession::with_seed(Bandit { resets: 0 }, params, 8).unwrap();
        let stop = session.stop_handle();

        session
            .train_with_progress(|progress| {
                if progress.episode >= 5 {
                    stop.store(true, Ordering::Relaxed);
                }
            })
            .unwrap();

        // The flag was set during the episode-5 callback, so exactly five
        // episodes ran to completion.
        assert_eq!(session.stats().total_episodes(), 5);
    }

    #[test]
    fn test_progress_callback_fires_on_the_interval() {
        let params = Hyperparameters {
            num_episodes: 10,
            eval_interval: 3,
            max_steps_per_episode: 10,
            ..Default::default()
        };
        let mut session = TrainingSession::with_seed(Bandit { resets: 0 }, params, 5).unwrap();

        let mut seen = Vec::new();
        session
            .train_with_progress(|progress| seen.push(progress.episode))
            .unwrap();
        assert_eq!(seen, vec![3, 6, 9]);
    }

    #[test]
    fn test_epsilon_decay_respects_the_floor() {
        let params = Hyperparameters {
            epsilon: 1.0,
            epsilon_decay: 0.5,
            min_epsilon: 0.2,
            num_episodes: 10,
            eval_interval: 10,
            max_steps_per_episode: 10,
            ..Default::default()
        };
        let mut session = TrainingSession::with_seed(Bandit { resets: 0 }, params, 6).unwrap();

        let mut last_epsilon = f64::NAN;
        session
            .train_with_progress(|progress| last_epsilon = progress.epsilon)
            .unwrap();
        assert_eq!(last_epsilon, 0.2);
    }
}
