// feemarket/src/types/block.rs

//! Block type and hashing.
//!
//! A block is what the transaction selector produces each step: an
//! ordered list of admitted transactions plus the running gas total the
//! admission loop ended with.
//!
//! Serialization is done with **bincode 2** using the `serde` integration
//! (`bincode::serde::encode_to_vec`) and an explicit `standard()` config.

use serde::{Deserialize, Serialize};

use super::{Gas, Hash256, Transaction, TxHash};
use crate::error::StepError;

/// Strongly-typed block hash.
///
/// BLAKE3-256 digest over the canonical bincode-2 serialization of the
/// block.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BlockHash(pub Hash256);

/// Selected transactions plus the admission loop's gas total.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Running gas total observed by the admission loop.
    ///
    /// Under [`AdmissionPolicy::CheckBeforeAdd`] this includes candidates
    /// that were considered after the block had filled and were therefore
    /// not admitted. Use [`Block::gas_used`] for the gas the block actually
    /// consumes.
    ///
    /// [`AdmissionPolicy::CheckBeforeAdd`]: crate::config::AdmissionPolicy::CheckBeforeAdd
    pub size: Gas,

    /// Admitted transactions, highest score first.
    pub txs: Vec<Transaction>,
}

impl Block {
    /// Returns a block with no transactions and zero size.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of admitted transactions.
    pub fn len(&self) -> usize {
        self.txs.len()
    }

    /// Returns `true` if no transaction was admitted.
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Sum of the gas used by the admitted transactions.
    pub fn gas_used(&self) -> Result<Gas, StepError> {
        self.txs.iter().try_fold(0 as Gas, |acc, tx| {
            acc.checked_add(tx.gas_used())
                .ok_or(StepError::GasOverflow("summing block gas"))
        })
    }

    /// Largest gas usage among the admitted transactions, 0 when empty.
    pub fn max_tx_gas(&self) -> Gas {
        self.txs.iter().map(Transaction::gas_used).max().unwrap_or(0)
    }

    /// Returns `true` if a transaction with `hash` was admitted.
    pub fn contains(&self, hash: &TxHash) -> bool {
        self.txs.iter().any(|tx| tx.hash() == *hash)
    }

    /// Returns the canonical byte representation of this block.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails. This is considered a programming
    /// error, because all fields are required to be serializable.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let cfg = bincode::config::standard();
        bincode::serde::encode_to_vec(self, cfg)
            .expect("Block should always be serializable with bincode 2 + serde")
    }

    /// Computes a canonical BLAKE3-256 hash for this block.
    pub fn compute_hash(&self) -> BlockHash {
        let bytes = self.canonical_bytes();
        BlockHash(Hash256::compute(&bytes))
    }
}
