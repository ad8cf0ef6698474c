//! Stores the block produced this step as `latest_block`.

use crate::error::StepError;
use crate::state::{PolicyOutput, StateUpdate, StepContext};

/// Records the policy's block unchanged.
pub fn record_latest_block(
    _ctx: &StepContext<'_>,
    policy: &PolicyOutput,
) -> Result<StateUpdate, StepError> {
    Ok(StateUpdate::LatestBlock(policy.block.clone()))
}
