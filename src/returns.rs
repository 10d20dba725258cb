// Return propagation and table updates for one completed trajectory
// Every-visit Monte Carlo with an incremental-mean blend

use std::fmt::Debug;
use std::hash::Hash;

use crate::episode::Trajectory;
use crate::table::ActionValueTable;

/// Fold a completed trajectory into the table.
///
/// Walks the trajectory in reverse chronological order, maintaining the
/// running discounted return `G = reward + gamma * G` (initialized to zero
/// past the last step), and blends each estimate with
/// `new = old + alpha * (G - old)`. The reverse order is a correctness
/// requirement, not an optimization: the return at each step depends on all
/// later rewards, so the update may only fire once the full suffix return is
/// known.
///
/// Every-visit semantics: each occurrence of a (state, action) pair in the
/// trajectory is updated, not only its first occurrence.
pub fn apply_returns<S>(
    trajectory: &Trajectory<S>,
    table: &mut ActionValueTable<S>,
    gamma: f64,
    alpha: f64,
) where
    S: Clone + Eq + Hash + Debug,
{
    let mut g = 0.0;
    for step in trajectory.steps().iter().rev() {
        g = step.reward + gamma * g;
        let old = table.values(&step.state)[step.action];
        table.update(&step.state, step.action, old + alpha * (g - old));
    }
}
