// feemarket/src/types/tx.rs

//! Transaction types for the fee market.
//!
//! A transaction is a synthetic demand sample: it carries the gas it would
//! consume and the fee terms its sender is willing to pay. Which variant
//! appears in a pool is decided by the active [`Mechanism`]:
//!
//! - [`LegacyTx`] bids a single flat fee per gas (first-price auction),
//! - [`Eip1559Tx`] bids a fee cap plus a premium on top of the base fee.

use serde::{Deserialize, Serialize};

use super::{Gas, TxHash, Wei};
use crate::config::Mechanism;
use crate::error::ValidationError;

/// First-price auction transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTx {
    /// Unique identifier of this transaction.
    pub hash: TxHash,

    /// Total gas the transaction consumes if included.
    pub gas_used: Gas,

    /// Flat fee per gas paid to the block producer.
    pub fee: Wei,
}

/// Base-fee mechanism transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip1559Tx {
    /// Unique identifier of this transaction.
    pub hash: TxHash,

    /// Total gas the transaction consumes if included.
    pub gas_used: Gas,

    /// Maximum total fee per gas (base fee plus tip) the sender accepts.
    ///
    /// A transaction whose cap is below the current base fee cannot be
    /// included at any price.
    pub fee_cap: Wei,

    /// Tip per gas offered to the block producer above the base fee.
    pub premium: Wei,
}

/// Top-level transaction enum.
///
/// This is the type that appears in demand pools and blocks. The shared
/// fields are reachable through [`Transaction::hash`] and
/// [`Transaction::gas_used`] regardless of the variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    /// Flat-fee transaction.
    Legacy(LegacyTx),

    /// Fee-cap plus premium transaction.
    Eip1559(Eip1559Tx),
}

impl Transaction {
    /// Returns the identifier of this transaction.
    pub fn hash(&self) -> TxHash {
        match self {
            Transaction::Legacy(tx) => tx.hash,
            Transaction::Eip1559(tx) => tx.hash,
        }
    }

    /// Returns the gas this transaction consumes.
    pub fn gas_used(&self) -> Gas {
        match self {
            Transaction::Legacy(tx) => tx.gas_used,
            Transaction::Eip1559(tx) => tx.gas_used,
        }
    }

    /// Returns the mechanism this transaction was built for.
    pub fn mechanism(&self) -> Mechanism {
        match self {
            Transaction::Legacy(_) => Mechanism::Legacy,
            Transaction::Eip1559(_) => Mechanism::Eip1559,
        }
    }

    /// Checks the intrinsic invariants of a transaction.
    ///
    /// Gas must be positive, and an EIP-1559 fee cap must cover its
    /// premium.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.gas_used() == 0 {
            return Err(ValidationError::ZeroGas(self.hash()));
        }
        if let Transaction::Eip1559(tx) = self {
            if tx.fee_cap < tx.premium {
                return Err(ValidationError::FeeCapBelowPremium {
                    hash: tx.hash,
                    fee_cap: tx.fee_cap,
                    premium: tx.premium,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GWEI;

    fn eip1559(fee_cap: Wei, premium: Wei, gas_used: Gas) -> Transaction {
        Transaction::Eip1559(Eip1559Tx {
            hash: TxHash::derive(0, 0, 1),
            gas_used,
            fee_cap,
            premium,
        })
    }

    #[test]
    fn accessors_cover_both_variants() {
        let legacy = Transaction::Legacy(LegacyTx {
            hash: TxHash::derive(0, 1, 1),
            gas_used: 21_000,
            fee: 3 * GWEI,
        });
        let priority = eip1559(5 * GWEI, 2 * GWEI, 25_000);

        assert_eq!(legacy.gas_used(), 21_000);
        assert_eq!(legacy.mechanism(), Mechanism::Legacy);
        assert_eq!(priority.gas_used(), 25_000);
        assert_eq!(priority.mechanism(), Mechanism::Eip1559);
        assert_ne!(legacy.hash(), priority.hash());
    }

    #[test]
    fn validate_rejects_fee_cap_below_premium() {
        let tx = eip1559(GWEI, 2 * GWEI, 21_000);
        match tx.validate().unwrap_err() {
            ValidationError::FeeCapBelowPremium { fee_cap, premium, .. } => {
                assert_eq!(fee_cap, GWEI);
                assert_eq!(premium, 2 * GWEI);
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_zero_gas() {
        let tx = eip1559(3 * GWEI, GWEI, 0);
        assert!(matches!(tx.validate(), Err(ValidationError::ZeroGas(_))));
    }

    #[test]
    fn validate_accepts_equal_cap_and_premium() {
        assert!(eip1559(3 * GWEI, 3 * GWEI, 21_000).validate().is_ok());
    }

    #[test]
    fn transaction_roundtrips_with_bincode2() {
        let tx = eip1559(7 * GWEI, GWEI, 29_999);

        let cfg = bincode::config::standard();
        let bytes = bincode::serde::encode_to_vec(&tx, cfg).expect("Transaction encode");
        let (decoded, _): (Transaction, usize) =
            bincode::serde::decode_from_slice(&bytes, cfg).expect("Transaction decode");

        assert_eq!(decoded, tx);
    }
}
