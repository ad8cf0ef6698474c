//! Base validity predicate for produced blocks.
//!
//! This validator enforces cheap, deterministic invariants of the
//! selector's output:
//!
//! - every admitted transaction is intrinsically valid,
//! - no transaction is admitted twice,
//! - admitted gas respects the bound implied by the admission policy,
//! - under EIP-1559, no admitted transaction is priced below the base fee.

use std::collections::HashSet;

use crate::config::{AdmissionPolicy, MarketConfig, Mechanism};
use crate::error::ValidationError;
use crate::state::SimState;
use crate::types::{Block, Gas, Transaction, TxHash};

use super::BlockValidator;

/// Base validity predicate for blocks.
#[derive(Clone, Debug)]
pub struct BaseValidity {
    mechanism: Mechanism,
    admission: AdmissionPolicy,
    max_block_size: Gas,
}

impl BaseValidity {
    /// Constructs a new `BaseValidity` from the market configuration.
    pub fn new(cfg: &MarketConfig) -> Self {
        Self {
            mechanism: cfg.mechanism,
            admission: cfg.admission,
            max_block_size: cfg.max_block_size(),
        }
    }

    fn check_transactions(&self, block: &Block) -> Result<(), ValidationError> {
        let mut seen: HashSet<TxHash> = HashSet::with_capacity(block.len());
        for tx in &block.txs {
            tx.validate()?;
            if !seen.insert(tx.hash()) {
                return Err(ValidationError::DuplicateTransaction(tx.hash()));
            }
        }
        Ok(())
    }

    fn check_gas_bound(&self, block: &Block) -> Result<(), ValidationError> {
        // An overflowing sum saturates and then fails the bound.
        let gas_used = block
            .txs
            .iter()
            .fold(0 as Gas, |acc, tx| acc.saturating_add(tx.gas_used()));
        let bound = match self.admission {
            AdmissionPolicy::CheckBeforeAdd => {
                self.max_block_size.saturating_add(block.max_tx_gas())
            }
            AdmissionPolicy::StrictFit => self.max_block_size,
        };
        if gas_used > bound {
            return Err(ValidationError::Oversized { gas_used, bound });
        }
        Ok(())
    }

    fn check_pricing(&self, block: &Block, state: &SimState) -> Result<(), ValidationError> {
        if self.mechanism != Mechanism::Eip1559 {
            return Ok(());
        }
        let Some(basefee) = state.basefee else {
            return Ok(());
        };
        for tx in &block.txs {
            if let Transaction::Eip1559(inner) = tx {
                if inner.fee_cap < basefee {
                    return Err(ValidationError::Underpriced {
                        hash: inner.hash,
                        fee_cap: inner.fee_cap,
                        basefee,
                    });
                }
            }
        }
        Ok(())
    }
}

impl BlockValidator for BaseValidity {
    fn validate(&self, block: &Block, state: &SimState) -> Result<(), ValidationError> {
        self.check_transactions(block)?;
        self.check_gas_bound(block)?;
        self.check_pricing(block, state)?;
        Ok(())
    }
}
