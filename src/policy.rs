// Action selection: epsilon-greedy during training, frozen argmax after
// Tie-breaking is deterministic throughout: the lowest action index wins

use rand::Rng;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::table::ActionValueTable;

/// Index of the highest estimate in a row, lowest index winning ties.
///
/// A strict `>` scan rather than `Iterator::max_by`, which keeps the last
/// maximum and would make tie-breaking depend on iteration direction.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (index, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = index;
        }
    }
    best
}

/// Epsilon-greedy action selection over the current table.
///
/// With probability `epsilon` draws a uniformly random action over the full
/// action space (exploration); otherwise takes the argmax of the state's
/// estimate vector (exploitation). `epsilon = 0` degenerates to pure greedy,
/// `epsilon = 1` to pure random. Reads through `values`, so an unseen state
/// materializes its zero row; the estimates themselves are never changed.
pub fn select_action<S, R>(
    table: &mut ActionValueTable<S>,
    state: &S,
    epsilon: f64,
    rng: &mut R,
) -> usize
where
    S: Clone + Eq + Hash + Debug,
    R: Rng,
{
    if rng.random::<f64>() < epsilon {
        rng.random_range(0..table.action_count())
    } else {
        argmax(table.values(state))
    }
}

/// Deterministic policy frozen from a table at extraction time.
///
/// A read-only snapshot: it does not track table mutation after extraction.
/// States absent from the snapshot have no action here; the evaluator covers
/// them with the environment's fallback sampler.
#[derive(Debug, Clone)]
pub struct GreedyPolicy<S> {
    actions: HashMap<S, usize>,
}

impl<S: Clone + Eq + Hash + Debug> GreedyPolicy<S> {
    /// Freeze the argmax action for every state the table has materialized
    pub fn extract(table: &ActionValueTable<S>) -> Self {
        let actions = table
            .iter()
            .map(|(state, values)| (state.clone(), argmax(values)))
            .collect();
        Self { actions }
    }

    /// The frozen action for `state`, if it was seen during training
    pub fn action(&self, state: &S) -> Option<usize> {
        self.actions.get(state).copied()
    }

    /// Number of states covered by the snapshot
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the snapshot covers no states at all
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
