//! State history storage.
//!
//! The engine appends one [`StateSnapshot`] per substep. This module
//! defines the [`HistoryStore`] interface and two in-memory backends:
//!
//! - [`mem::InMemoryHistory`] keeps every snapshot, for analysis and tests,
//! - [`window::WindowedHistory`] keeps only the most recent snapshots, for
//!   long runs where only summaries are wanted.

pub mod mem;
pub mod window;

pub use mem::InMemoryHistory;
pub use window::WindowedHistory;

use crate::state::StateSnapshot;

/// Abstract history interface used by the simulation engine.
///
/// The interface is intentionally small: the engine only appends
/// snapshots and hands the retained ones to step functions as context.
pub trait HistoryStore {
    /// Appends a snapshot.
    fn push(&mut self, snapshot: StateSnapshot);

    /// Retained snapshots, oldest first.
    fn snapshots(&self) -> &[StateSnapshot];

    /// Most recent snapshot, if any.
    fn latest(&self) -> Option<&StateSnapshot> {
        self.snapshots().last()
    }

    /// Number of retained snapshots.
    fn len(&self) -> usize {
        self.snapshots().len()
    }

    /// Returns `true` if nothing is retained.
    fn is_empty(&self) -> bool {
        self.snapshots().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SimState;

    #[test]
    fn history_store_trait_is_object_safe() {
        fn push_through_trait_object(store: &mut dyn HistoryStore) {
            store.push(StateSnapshot {
                run: 0,
                timestep: 0,
                substep: 0,
                state: SimState::default(),
            });
        }

        let mut store = InMemoryHistory::new();
        push_through_trait_object(&mut store);
        assert_eq!(store.len(), 1);
        assert_eq!(store.latest().map(|s| s.timestep), Some(0));
    }
}
