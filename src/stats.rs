// Training statistics: observation only, never fed back into learning

use std::collections::VecDeque;

/// Rolling view of training progress, surfaced through the progress callback.
///
/// Tracks per-episode undiscounted return and episode length over a rolling
/// window, plus session-wide totals. Purely observational.
#[derive(Debug, Clone)]
pub struct TrainingStats {
    episode_returns: VecDeque<f64>,
    episode_lengths: VecDeque<usize>,
    total_episodes: usize,
    total_steps: usize,
    cumulative_return: f64,
    window_size: usize,
}

impl TrainingStats {
    /// Create a tracker keeping the most recent `window_size` episodes
    pub fn new(window_size: usize) -> Self {
        Self {
            episode_returns: VecDeque::with_capacity(window_size),
            episode_lengths: VecDeque::with_capacity(window_size),
            total_episodes: 0,
            total_steps: 0,
            cumulative_return: 0.0,
            window_size,
        }
    }

    /// Record one completed episode
    pub fn record_episode(&mut self, undiscounted_return: f64, length: usize) {
        if self.episode_returns.len() == self.window_size {
            self.episode_returns.pop_front();
            self.episode_lengths.pop_front();
        }
        self.episode_returns.push_back(undiscounted_return);
        self.episode_lengths.push_back(length);
        self.total_episodes += 1;
        self.total_steps += length;
        self.cumulative_return += undiscounted_return;
    }

    /// Episodes completed so far in this session
    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    /// Environment steps taken so far in this session
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Sum of undiscounted returns over the whole session
    pub fn cumulative_return(&self) -> f64 {
        self.cumulative_return
    }

    /// Mean undiscounted return over the rolling window
    pub fn mean_return(&self) -> f64 {
        if self.episode_returns.is_empty() {
            return 0.0;
        }
        self.episode_returns.iter().sum::<f64>() / self.episode_returns.len() as f64
    }

    /// Mean episode length over the rolling window
    pub fn mean_length(&self) -> f64 {
        if self.episode_lengths.is_empty() {
            return 0.0;
        }
        self.episode_lengths.iter().sum::<usize>() as f64 / self.episode_lengths.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats_report_zero() {
        let stats = TrainingStats::new(10);
        assert_eq!(stats.total_episodes(), 0);
        assert_eq!(stats.mean_return(), 0.0);
        assert_eq!(stats.mean_length(), 0.0);
    }

    #[test]
    fn test_window_rolls_but_totals_accumulate() {
        let mut stats = TrainingStats::new(2);
        stats.record_episode(1.0, 10);
        stats.record_episode(2.0, 20);
        stats.record_episode(3.0, 30);

        // Window holds the last two episodes only
        assert_eq!(stats.mean_return(), 2.5);
        assert_eq!(stats.mean_length(), 25.0);

        // Totals cover all three
        assert_eq!(stats.total_episodes(), 3);
        assert_eq!(stats.total_steps(), 60);
        assert_eq!(stats.cumulative_return(), 6.0);
    }
}
