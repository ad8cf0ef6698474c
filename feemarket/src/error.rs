//! Error types shared by the step functions, validators and the engine.

use thiserror::Error;

use crate::config::Mechanism;
use crate::state::StateKey;
use crate::types::{Gas, TxHash, Wei};

/// Invalid constant or range in a market configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("eip1559.target_size must be positive")]
    ZeroTarget,

    #[error("eip1559.basefee_max_change_denominator must be positive")]
    ZeroDenominator,

    #[error("max_block_size must be positive")]
    ZeroMaxBlockSize,

    #[error("eip1559.target_size {target} exceeds max_block_size {max}")]
    TargetExceedsMax { target: Gas, max: Gas },

    #[error("demand.gas_used must start above zero")]
    ZeroGas,

    #[error("{name} is empty: low {low} > high {high}")]
    EmptyRange {
        name: &'static str,
        low: u64,
        high: u64,
    },

    #[error("history window must hold at least one snapshot")]
    ZeroWindow,
}

/// A transaction or block violates a validity predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("transaction {0} uses no gas")]
    ZeroGas(TxHash),

    #[error("transaction {hash} has fee cap {fee_cap} below premium {premium}")]
    FeeCapBelowPremium {
        hash: TxHash,
        fee_cap: Wei,
        premium: Wei,
    },

    #[error("transaction {0} appears twice in the block")]
    DuplicateTransaction(TxHash),

    #[error("block uses {gas_used} gas, exceeds bound {bound}")]
    Oversized { gas_used: Gas, bound: Gas },

    #[error("transaction {hash} has fee cap {fee_cap} below base fee {basefee}")]
    Underpriced {
        hash: TxHash,
        fee_cap: Wei,
        basefee: Wei,
    },
}

/// Failure of a single step function or of the engine driving them.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("required state key `{0}` is absent")]
    MissingState(StateKey),

    #[error("transaction {hash} belongs to the {found} mechanism, expected {expected}")]
    MechanismMismatch {
        hash: TxHash,
        expected: Mechanism,
        found: Mechanism,
    },

    #[error("gas total overflowed while {0}")]
    GasOverflow(&'static str),

    #[error("fee arithmetic overflowed while {0}")]
    FeeOverflow(&'static str),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}
