//! Core domain types used by the fee-market model.
//!
//! This module defines strongly-typed hashes and the unit aliases shared
//! by transactions, blocks and the step functions. The goal is to avoid
//! "naked" byte buffers and bare integers with an implicit unit in public
//! APIs.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Block type and canonical hashing.
pub mod block;
/// Transaction variants for both fee mechanisms.
pub mod tx;

pub use block::{Block, BlockHash};
pub use tx::{Eip1559Tx, LegacyTx, Transaction};

/// Length in bytes of all 256-bit hash types used in this module.
pub const HASH_LEN: usize = 32;

/// Units of computational work consumed by a transaction.
pub type Gas = u64;

/// Fee per unit of gas, denominated in wei.
pub type Wei = u64;

/// Number of wei in one gwei.
pub const GWEI: Wei = 1_000_000_000;

/// Strongly-typed 256-bit hash wrapper (BLAKE3-256).
///
/// Human-readable serializers (JSON, TOML) see a lowercase hex string so
/// the hash can be used as a map key; binary serializers see the raw
/// 32 bytes.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Hash256(pub [u8; HASH_LEN]);

impl Hash256 {
    /// Computes a new [`Hash256`] as the BLAKE3-256 hash of `data`.
    pub fn compute(data: &[u8]) -> Self {
        let h = blake3::hash(data);
        Hash256(*h.as_bytes())
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short prefix keeps block dumps readable.
        write!(f, "Hash256({}..)", &hex::encode(&self.0[..4]))
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(self.0))
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            let bytes = hex::decode(&s).map_err(D::Error::custom)?;
            let arr: [u8; HASH_LEN] = bytes
                .try_into()
                .map_err(|_| D::Error::custom("expected 32-byte hash"))?;
            Ok(Hash256(arr))
        } else {
            <[u8; HASH_LEN]>::deserialize(deserializer).map(Hash256)
        }
    }
}

/// Transaction identifier.
///
/// Synthetic transactions carry no payload, so the identifier is derived
/// from where the transaction was generated (timestep and position in the
/// pool) plus a random nonce drawn from the run's generator. Two
/// transactions of the same step therefore never collide, and the same
/// seed always yields the same identifiers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub Hash256);

impl TxHash {
    /// Derives a transaction hash from its generation coordinates.
    pub fn derive(timestep: u64, index: u64, nonce: u64) -> Self {
        let mut buf = [0u8; 24];
        buf[..8].copy_from_slice(&timestep.to_le_bytes());
        buf[8..16].copy_from_slice(&index.to_le_bytes());
        buf[16..].copy_from_slice(&nonce.to_le_bytes());
        TxHash(Hash256::compute(&buf))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
