//! Market and simulation configuration.
//!
//! This module aggregates the read-only constants of the model:
//!
//! - which fee mechanism is active (`Mechanism`),
//! - how the selector admits transactions (`AdmissionPolicy`),
//! - the demand generator's ranges (`DemandParams`),
//! - per-mechanism block limits and base-fee tuning (`Eip1559Params`,
//!   `LegacyParams`),
//! - run length and seeding (`SimulationConfig`).
//!
//! Every struct implements `Default` with the reference values and is
//! deserializable with `#[serde(default)]`, so a config file only needs to
//! name the fields it changes.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{GWEI, Gas, Wei};

/// Active fee mechanism.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mechanism {
    /// First-price auction on a flat per-gas fee.
    Legacy,
    /// Base fee plus priority premium, with base-fee adjustment per block.
    Eip1559,
}

impl Mechanism {
    /// Stable lowercase name, used for metric labels and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mechanism::Legacy => "legacy",
            Mechanism::Eip1559 => "eip1559",
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the selector decides whether a candidate enters the block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionPolicy {
    /// Admit while the running total is still below the limit, and add
    /// every considered candidate's gas to the total.
    ///
    /// The check happens before the addition, so the last admitted
    /// transaction may push the block past the limit by up to its own gas.
    #[default]
    CheckBeforeAdd,
    /// Admit a candidate only if it fits entirely; only admitted gas is
    /// counted and scanning continues past candidates that do not fit.
    StrictFit,
}

/// Inclusive integer range sampled uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformRange {
    pub low: u64,
    pub high: u64,
}

impl UniformRange {
    pub const fn new(low: u64, high: u64) -> Self {
        Self { low, high }
    }

    /// Returns `true` if `value` lies within the range.
    pub fn contains(&self, value: u64) -> bool {
        (self.low..=self.high).contains(&value)
    }

    fn check(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.low > self.high {
            return Err(ConfigError::EmptyRange {
                name,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }

    /// Draws one value uniformly from the range.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        name: &'static str,
        rng: &mut R,
    ) -> Result<u64, ConfigError> {
        self.check(name)?;
        Ok(rng.random_range(self.low..=self.high))
    }
}

/// Demand generator parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandParams {
    /// Number of transactions synthesized per step.
    pub mempool_length: usize,
    /// Gas used per transaction.
    pub gas_used: UniformRange,
    /// EIP-1559 premium, in gwei.
    pub premium_gwei: UniformRange,
    /// EIP-1559 fee cap, in gwei.
    pub fee_cap_gwei: UniformRange,
    /// Legacy flat fee, in gwei.
    pub legacy_fee_gwei: UniformRange,
    /// Draw fee terms per transaction instead of once per step.
    pub per_transaction_fees: bool,
}

impl Default for DemandParams {
    fn default() -> Self {
        Self {
            mempool_length: 100,
            gas_used: UniformRange::new(20_000, 30_000),
            premium_gwei: UniformRange::new(1, 3),
            fee_cap_gwei: UniformRange::new(3, 7),
            legacy_fee_gwei: UniformRange::new(3, 7),
            per_transaction_fees: false,
        }
    }
}

impl DemandParams {
    fn validate(&self) -> Result<(), ConfigError> {
        self.gas_used.check("demand.gas_used")?;
        if self.gas_used.low == 0 {
            return Err(ConfigError::ZeroGas);
        }
        self.premium_gwei.check("demand.premium_gwei")?;
        self.fee_cap_gwei.check("demand.fee_cap_gwei")?;
        self.legacy_fee_gwei.check("demand.legacy_fee_gwei")?;
        Ok(())
    }
}

/// Base-fee mechanism constants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Eip1559Params {
    /// Bounds the per-block relative base-fee change to `1 / denominator`.
    pub basefee_max_change_denominator: u64,
    /// Block gas at which the base fee stays unchanged.
    pub target_size: Gas,
    /// Block gas limit used by the selector.
    pub max_block_size: Gas,
    /// Base fee of the first block.
    pub initial_basefee: Wei,
    /// Lower bound the base fee is clamped to after each update.
    pub min_basefee: Wei,
}

impl Default for Eip1559Params {
    fn default() -> Self {
        Self {
            basefee_max_change_denominator: 8,
            target_size: 12_500_000,
            max_block_size: 25_000_000,
            initial_basefee: GWEI,
            min_basefee: 0,
        }
    }
}

impl Eip1559Params {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.target_size == 0 {
            return Err(ConfigError::ZeroTarget);
        }
        if self.basefee_max_change_denominator == 0 {
            return Err(ConfigError::ZeroDenominator);
        }
        if self.max_block_size == 0 {
            return Err(ConfigError::ZeroMaxBlockSize);
        }
        if self.target_size > self.max_block_size {
            return Err(ConfigError::TargetExceedsMax {
                target: self.target_size,
                max: self.max_block_size,
            });
        }
        Ok(())
    }
}

/// First-price auction constants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyParams {
    /// Block gas limit used by the selector.
    pub max_block_size: Gas,
}

impl Default for LegacyParams {
    fn default() -> Self {
        Self {
            max_block_size: 12_500_000,
        }
    }
}

/// Full parameter set of one simulated market.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub mechanism: Mechanism,
    pub admission: AdmissionPolicy,
    pub demand: DemandParams,
    pub eip1559: Eip1559Params,
    pub legacy: LegacyParams,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self::for_mechanism(Mechanism::Eip1559)
    }
}

impl MarketConfig {
    /// Reference configuration for `mechanism`.
    pub fn for_mechanism(mechanism: Mechanism) -> Self {
        Self {
            mechanism,
            admission: AdmissionPolicy::default(),
            demand: DemandParams::default(),
            eip1559: Eip1559Params::default(),
            legacy: LegacyParams::default(),
        }
    }

    /// Block gas limit of the active mechanism.
    pub fn max_block_size(&self) -> Gas {
        match self.mechanism {
            Mechanism::Legacy => self.legacy.max_block_size,
            Mechanism::Eip1559 => self.eip1559.max_block_size,
        }
    }

    /// Gas level a block is measured against for utilisation: the target
    /// under EIP-1559, the hard limit under the legacy auction.
    pub fn utilisation_target(&self) -> Gas {
        match self.mechanism {
            Mechanism::Legacy => self.legacy.max_block_size,
            Mechanism::Eip1559 => self.eip1559.target_size,
        }
    }

    /// Checks the constants the active mechanism relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.demand.validate()?;
        match self.mechanism {
            Mechanism::Legacy => {
                if self.legacy.max_block_size == 0 {
                    return Err(ConfigError::ZeroMaxBlockSize);
                }
            }
            Mechanism::Eip1559 => self.eip1559.validate()?,
        }
        Ok(())
    }
}

/// Run length and seeding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Timesteps (blocks) per run.
    pub timesteps: u64,
    /// Independent runs per mechanism.
    pub runs: usize,
    /// Base seed; run `r` is seeded with `seed + r`.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timesteps: 100,
            runs: 1,
            seed: 0,
        }
    }
}

impl SimulationConfig {
    /// Seed of the run with index `run`.
    pub fn run_seed(&self, run: usize) -> u64 {
        self.seed.wrapping_add(run as u64)
    }
}
