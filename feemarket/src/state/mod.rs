//! Simulation state and the typed updates step functions return.
//!
//! Every step function computes the new value of exactly one state field.
//! Instead of an arbitrary `(String, value)` pair, the result is a
//! [`StateUpdate`], whose [`StateKey`] comes from a closed set.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{MarketConfig, Mechanism};
use crate::error::StepError;
use crate::types::{Block, Transaction, TxHash, Wei};

pub mod context;

pub use context::{PolicyOutput, StepContext};

/// Pending transactions keyed by hash.
///
/// Ordered so that iteration, and anything derived from it, is
/// reproducible for a given seed.
pub type DemandPool = BTreeMap<TxHash, Transaction>;

/// Names of the fields a step function may read or write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKey {
    MempoolLength,
    Basefee,
    Demand,
    LatestBlock,
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StateKey::MempoolLength => "mempool_length",
            StateKey::Basefee => "basefee",
            StateKey::Demand => "demand",
            StateKey::LatestBlock => "latest_block",
        })
    }
}

/// New value for one state field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateUpdate {
    Basefee(Wei),
    Demand(DemandPool),
    LatestBlock(Block),
}

impl StateUpdate {
    /// The field this update writes.
    pub fn key(&self) -> StateKey {
        match self {
            StateUpdate::Basefee(_) => StateKey::Basefee,
            StateUpdate::Demand(_) => StateKey::Demand,
            StateUpdate::LatestBlock(_) => StateKey::LatestBlock,
        }
    }
}

/// Snapshot of the simulated market between two substeps.
///
/// Fields are optional because not every mechanism uses every field (the
/// legacy auction has no base fee) and because a hand-built state may omit
/// them; accessors turn an absent field into [`StepError::MissingState`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimState {
    pub mempool_length: Option<usize>,
    pub basefee: Option<Wei>,
    pub demand: Option<DemandPool>,
    pub latest_block: Option<Block>,
}

impl SimState {
    /// State at timestep 0 for `cfg`.
    pub fn initial(cfg: &MarketConfig) -> Self {
        let basefee = match cfg.mechanism {
            Mechanism::Eip1559 => Some(cfg.eip1559.initial_basefee),
            Mechanism::Legacy => None,
        };
        Self {
            mempool_length: Some(cfg.demand.mempool_length),
            basefee,
            demand: Some(DemandPool::new()),
            latest_block: None,
        }
    }

    pub fn mempool_length(&self) -> Result<usize, StepError> {
        self.mempool_length
            .ok_or(StepError::MissingState(StateKey::MempoolLength))
    }

    pub fn basefee(&self) -> Result<Wei, StepError> {
        self.basefee.ok_or(StepError::MissingState(StateKey::Basefee))
    }

    pub fn demand(&self) -> Result<&DemandPool, StepError> {
        self.demand
            .as_ref()
            .ok_or(StepError::MissingState(StateKey::Demand))
    }

    pub fn latest_block(&self) -> Result<&Block, StepError> {
        self.latest_block
            .as_ref()
            .ok_or(StepError::MissingState(StateKey::LatestBlock))
    }

    /// Writes `update` into the matching field.
    pub fn apply(&mut self, update: StateUpdate) {
        match update {
            StateUpdate::Basefee(v) => self.basefee = Some(v),
            StateUpdate::Demand(v) => self.demand = Some(v),
            StateUpdate::LatestBlock(v) => self.latest_block = Some(v),
        }
    }
}

/// State recorded after a substep of a run.
///
/// Timestep 0, substep 0 holds the initial state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub run: usize,
    pub timestep: u64,
    pub substep: usize,
    pub state: SimState,
}
