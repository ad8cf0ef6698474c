//! Bounded history keeping only the most recent snapshots.

use crate::error::ConfigError;
use crate::state::StateSnapshot;

use super::HistoryStore;

/// [`HistoryStore`] that retains at most `capacity` snapshots.
#[derive(Clone, Debug)]
pub struct WindowedHistory {
    capacity: usize,
    snapshots: Vec<StateSnapshot>,
}

impl WindowedHistory {
    /// Creates a window of `capacity` snapshots.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(Self {
            capacity,
            snapshots: Vec::with_capacity(capacity + 1),
        })
    }
}

impl HistoryStore for WindowedHistory {
    fn push(&mut self, snapshot: StateSnapshot) {
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.capacity {
            let excess = self.snapshots.len() - self.capacity;
            self.snapshots.drain(..excess);
        }
    }

    fn snapshots(&self) -> &[StateSnapshot] {
        &self.snapshots
    }
}
