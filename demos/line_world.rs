// Example demonstrating the Monte Carlo control engine on a line world
// The agent starts mid-corridor; the right end pays +1, the left end -1

use anyhow::Result;
use mc_control::{Environment, GreedyPolicy, Hyperparameters, Step, TrainingSession};

/// A corridor of `length` cells. Action 0 moves left, action 1 moves right.
/// Reaching the rightmost cell pays +1, the leftmost -1; both end the episode.
struct LineWorld {
    length: u32,
    position: u32,
}

impl LineWorld {
    fn new(length: u32) -> Self {
        Self {
            length,
            position: length / 2,
        }
    }
}

impl Environment for LineWorld {
    type State = u32;

    fn reset(&mut self) -> Result<u32> {
        self.position = self.length / 2;
        Ok(self.position)
    }

    fn step(&mut self, action: usize) -> Result<Step<u32>> {
        if action == 0 {
            self.position -= 1;
        } else {
            self.position += 1;
        }
        if self.position == 0 {
            Ok(Step::new(self.position, -1.0, true))
        } else if self.position == self.length - 1 {
            Ok(Step::new(self.position, 1.0, true))
        } else {
            Ok(Step::new(self.position, 0.0, false))
        }
    }

    fn action_count(&self) -> usize {
        2
    }
}

fn main() -> Result<()> {
    mc_control::init()?;

    let params = Hyperparameters {
        num_episodes: 5_000,
        eval_interval: 500,
        max_steps_per_episode: 200,
        ..Default::default()
    };

    let mut session = TrainingSession::new(LineWorld::new(9), params)?;
    session.train_with_progress(|progress| {
        println!(
            "episode {:>5}: mean return {:+.3} over {} known states",
            progress.episode,
            progress.stats.mean_return(),
            progress.table.len()
        );
    })?;

    let policy: GreedyPolicy<u32> = session.extract();
    let win_rate = session.evaluate(&policy, 1_000)?;
    println!("win rate after training: {:.2}%", win_rate * 100.0);

    Ok(())
}
