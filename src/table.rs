// Action-value table: the single piece of mutable shared state
// Maps each visited state to a fixed-length vector of per-action estimates

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::trace;

/// Tabular action-value estimates for a discrete MDP.
///
/// Every state that has ever been acted upon has an entry; an unseen state
/// lazily materializes an all-zero vector of `action_count` entries on first
/// access. The materialization is idempotent and never disturbs other
/// entries. The table is owned exclusively by the training session while
/// training runs and is read-only afterwards.
#[derive(Debug, Clone)]
pub struct ActionValueTable<S> {
    entries: HashMap<S, Vec<f64>>,
    action_count: usize,
}

impl<S: Clone + Eq + Hash + Debug> ActionValueTable<S> {
    /// Create an empty table for an action space of the given cardinality
    pub fn new(action_count: usize) -> Self {
        Self {
            entries: HashMap::new(),
            action_count,
        }
    }

    /// Size of the action space this table was built for
    pub fn action_count(&self) -> usize {
        self.action_count
    }

    /// Estimate vector for `state`, materializing zeros on first access
    pub fn values(&mut self, state: &S) -> &[f64] {
        let action_count = self.action_count;
        self.entries.entry(state.clone()).or_insert_with(|| {
            trace!(state = ?state, "materializing zero-value entry");
            vec![0.0; action_count]
        })
    }

    /// Non-materializing read; `None` if the state has never been accessed
    pub fn peek(&self, state: &S) -> Option<&[f64]> {
        self.entries.get(state).map(Vec::as_slice)
    }

    /// Overwrite exactly one scalar estimate.
    ///
    /// `action` outside `[0, action_count)` is a contract violation by the
    /// caller, not a recoverable failure.
    pub fn update(&mut self, state: &S, action: usize, new_value: f64) {
        debug_assert!(action < self.action_count, "action {} out of range", action);
        let action_count = self.action_count;
        let row = self
            .entries
            .entry(state.clone())
            .or_insert_with(|| vec![0.0; action_count]);
        row[action] = new_value;
    }

    /// Iterate over all materialized (state, estimates) entries
    pub fn iter(&self) -> impl Iterator<Item = (&S, &[f64])> {
        self.entries.iter().map(|(s, v)| (s, v.as_slice()))
    }

    /// Number of states with a materialized entry
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no state has been accessed yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
