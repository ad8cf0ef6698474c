//! Fee-market library crate.
//!
//! This crate provides the building blocks for simulating and comparing
//! two transaction fee markets, a legacy first-price auction and EIP-1559:
//!
//! - strongly-typed domain types (`types`),
//! - market and simulation parameters (`config`),
//! - simulation state and typed state updates (`state`),
//! - the step functions of the model (`market`),
//! - block validity predicates (`validation`),
//! - history backends (`storage`),
//! - Prometheus-based metrics (`metrics`),
//! - and an engine running the substeps of a model (`sim`).
//!
//! Higher-level binaries compose these pieces into experiment harnesses.

pub mod config;
pub mod error;
pub mod market;
pub mod metrics;
pub mod sim;
pub mod state;
pub mod storage;
pub mod types;
pub mod validation;

// Re-export configuration types.
pub use config::{
    AdmissionPolicy, DemandParams, Eip1559Params, LegacyParams, MarketConfig, Mechanism,
    SimulationConfig, UniformRange,
};

pub use error::{ConfigError, StepError, ValidationError};

// Re-export state and step functions.
pub use market::{
    effective_priority_fee, generate_demand, next_basefee, record_latest_block, select_eip1559,
    select_legacy, select_transactions, update_basefee,
};
pub use state::{DemandPool, PolicyOutput, SimState, StateKey, StateSnapshot, StateUpdate, StepContext};

// Re-export engine, history backends and validators.
pub use sim::{Model, RunSummary, SimulationEngine, StepRecord, Substep, step_records};
pub use storage::{HistoryStore, InMemoryHistory, WindowedHistory};
pub use validation::{AcceptAllValidator, BaseValidity, BlockValidator};

pub use metrics::{MarketMetrics, MetricsRegistry};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Engine keeping the full history and checking every block.
pub type DefaultEngine = SimulationEngine<InMemoryHistory, BaseValidity>;

impl DefaultEngine {
    /// Builds an engine for run `run` of `config` with the default stack.
    pub fn with_defaults(config: MarketConfig, run: usize, seed: u64) -> Result<Self, StepError> {
        let validator = BaseValidity::new(&config);
        SimulationEngine::for_run(config, InMemoryHistory::new(), validator, run, seed)
    }
}
