//! Unbounded in-memory history.

use crate::state::StateSnapshot;

use super::HistoryStore;

/// In-memory implementation of [`HistoryStore`] that keeps every snapshot.
#[derive(Clone, Debug, Default)]
pub struct InMemoryHistory {
    snapshots: Vec<StateSnapshot>,
}

impl InMemoryHistory {
    /// Creates a new, empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the store and returns all snapshots.
    pub fn into_snapshots(self) -> Vec<StateSnapshot> {
        self.snapshots
    }
}

impl HistoryStore for InMemoryHistory {
    fn push(&mut self, snapshot: StateSnapshot) {
        self.snapshots.push(snapshot);
    }

    fn snapshots(&self) -> &[StateSnapshot] {
        &self.snapshots
    }
}
