//! Block validity predicates.
//!
//! The engine runs a [`BlockValidator`] over every block the selector
//! produces, before any state update sees it. It currently provides:
//!
//! - [`AcceptAllValidator`]: accepts everything, for isolating engine logic.
//! - [`base::BaseValidity`]: cheap structural, size and pricing checks.

pub mod base;

pub use base::BaseValidity;

use crate::error::ValidationError;
use crate::state::SimState;
use crate::types::Block;

/// Pluggable validity predicate for produced blocks.
///
/// `state` is the state the block was selected from, so pricing checks see
/// the base fee the selector used. Implementations should be deterministic
/// and side-effect free.
pub trait BlockValidator {
    fn validate(&self, block: &Block, state: &SimState) -> Result<(), ValidationError>;
}

/// A trivial validator that accepts every block.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAllValidator;

impl BlockValidator for AcceptAllValidator {
    fn validate(&self, _block: &Block, _state: &SimState) -> Result<(), ValidationError> {
        Ok(())
    }
}
