//! Substep tables wiring the step functions together.
//!
//! A timestep runs the substeps of a [`Model`] in order. Within a block
//! substep every update sees the same prior state and the same policy
//! output; their results are merged only after all of them have run.

use std::fmt;

use crate::config::Mechanism;
use crate::error::StepError;
use crate::market::{record_latest_block, select_eip1559, select_legacy, update_basefee};
use crate::state::{PolicyOutput, StateUpdate, StepContext};

/// Block-producing policy.
pub type PolicyFn = fn(&StepContext<'_>) -> Result<PolicyOutput, StepError>;

/// State update fed by a policy output.
pub type UpdateFn = fn(&StepContext<'_>, &PolicyOutput) -> Result<StateUpdate, StepError>;

/// One stage of a timestep.
#[derive(Clone)]
pub enum Substep {
    /// Refreshes the demand pool from the run's random source.
    Demand,
    /// Produces a block and applies the listed updates to it.
    Block {
        policy: PolicyFn,
        updates: Vec<UpdateFn>,
    },
}

impl fmt::Debug for Substep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Substep::Demand => f.write_str("Demand"),
            Substep::Block { updates, .. } => f
                .debug_struct("Block")
                .field("updates", &updates.len())
                .finish_non_exhaustive(),
        }
    }
}

/// Ordered substeps for one mechanism.
#[derive(Clone, Debug)]
pub struct Model {
    mechanism: Mechanism,
    substeps: Vec<Substep>,
}

impl Model {
    /// Demand first, then select a block and apply the mechanism's updates.
    pub fn for_mechanism(mechanism: Mechanism) -> Self {
        let block = match mechanism {
            Mechanism::Legacy => Substep::Block {
                policy: select_legacy,
                updates: vec![record_latest_block as UpdateFn],
            },
            Mechanism::Eip1559 => Substep::Block {
                policy: select_eip1559,
                updates: vec![update_basefee as UpdateFn, record_latest_block],
            },
        };
        Self {
            mechanism,
            substeps: vec![Substep::Demand, block],
        }
    }

    pub fn mechanism(&self) -> Mechanism {
        self.mechanism
    }

    pub fn substeps(&self) -> &[Substep] {
        &self.substeps
    }
}
