//! Typed call context for step functions.

use crate::config::MarketConfig;
use crate::types::Block;

use super::{SimState, StateSnapshot};

/// Everything a step function may look at.
///
/// The context is borrowed for the duration of a single call; step
/// functions never keep references beyond it.
#[derive(Clone, Copy, Debug)]
pub struct StepContext<'a> {
    /// Market constants for this run.
    pub params: &'a MarketConfig,
    /// Current timestep, starting at 1 for the first produced block.
    pub timestep: u64,
    /// 1-based index of the substep being executed.
    pub substep: usize,
    /// Snapshots recorded so far, oldest first. May be truncated by the
    /// history store.
    pub history: &'a [StateSnapshot],
    /// State as of the end of the previous substep.
    pub state: &'a SimState,
}

impl<'a> StepContext<'a> {
    /// Context for a standalone call outside an engine run.
    pub fn detached(params: &'a MarketConfig, state: &'a SimState) -> Self {
        Self {
            params,
            timestep: 0,
            substep: 0,
            history: &[],
            state,
        }
    }
}

/// Output of the block-producing policy, fed to every update of the same
/// substep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicyOutput {
    /// Block assembled from the demand pool.
    pub block: Block,
    /// Candidates dropped because their fee cap was below the base fee.
    pub underpriced: usize,
}
