//! Demand generator.
//!
//! Synthesizes the pool of pending transactions for one step. By default
//! the fee terms are drawn once per step and shared by every transaction
//! in the pool (a common market sentiment per block); only gas usage and
//! identity vary per transaction.

use rand::Rng;

use crate::config::{DemandParams, Mechanism};
use crate::error::StepError;
use crate::state::{DemandPool, StateUpdate, StepContext};
use crate::types::{Eip1559Tx, GWEI, LegacyTx, Transaction, TxHash, Wei};

/// Fee terms applied to a generated transaction.
#[derive(Clone, Copy, Debug)]
enum FeeTerms {
    Legacy { fee: Wei },
    Eip1559 { fee_cap: Wei, premium: Wei },
}

fn gwei(value: u64) -> Result<Wei, StepError> {
    value
        .checked_mul(GWEI)
        .ok_or(StepError::FeeOverflow("converting gwei to wei"))
}

/// Draws the fee terms of one transaction, or of a whole step when terms
/// are shared.
///
/// Every variant's terms are drawn under either mechanism, in a fixed
/// order. The generator then sits at the same position for the gas and
/// nonce draws that follow, so equal seeds give both mechanisms the same
/// gas and hashes.
fn draw_fee_terms<R: Rng + ?Sized>(
    mechanism: Mechanism,
    params: &DemandParams,
    rng: &mut R,
) -> Result<FeeTerms, StepError> {
    let premium = gwei(params.premium_gwei.sample("demand.premium_gwei", rng)?)?;
    let fee_cap = gwei(params.fee_cap_gwei.sample("demand.fee_cap_gwei", rng)?)?;
    let fee = gwei(params.legacy_fee_gwei.sample("demand.legacy_fee_gwei", rng)?)?;

    match mechanism {
        Mechanism::Legacy => Ok(FeeTerms::Legacy { fee }),
        // Overlapping ranges could draw a premium above the cap; a sender
        // never tips more than it is willing to pay in total.
        Mechanism::Eip1559 => Ok(FeeTerms::Eip1559 {
            fee_cap,
            premium: premium.min(fee_cap),
        }),
    }
}

/// Generates this step's demand pool.
///
/// Reads `mempool_length` from state and returns a [`StateUpdate::Demand`]
/// holding that many fresh transactions of the active mechanism's variant.
pub fn generate_demand<R: Rng + ?Sized>(
    ctx: &StepContext<'_>,
    rng: &mut R,
) -> Result<StateUpdate, StepError> {
    let mempool_length = ctx.state.mempool_length()?;
    let params = &ctx.params.demand;
    let mechanism = ctx.params.mechanism;

    let shared = if params.per_transaction_fees {
        None
    } else {
        Some(draw_fee_terms(mechanism, params, rng)?)
    };

    let mut pool = DemandPool::new();
    for index in 0..mempool_length {
        let terms = match shared {
            Some(terms) => terms,
            None => draw_fee_terms(mechanism, params, rng)?,
        };
        let gas_used = params.gas_used.sample("demand.gas_used", rng)?;
        let hash = TxHash::derive(ctx.timestep, index as u64, rng.random());

        let tx = match terms {
            FeeTerms::Legacy { fee } => Transaction::Legacy(LegacyTx {
                hash,
                gas_used,
                fee,
            }),
            FeeTerms::Eip1559 { fee_cap, premium } => Transaction::Eip1559(Eip1559Tx {
                hash,
                gas_used,
                fee_cap,
                premium,
            }),
        };
        pool.insert(hash, tx);
    }

    tracing::debug!(
        timestep = ctx.timestep,
        %mechanism,
        transactions = pool.len(),
        ?shared,
        "generated demand"
    );

    Ok(StateUpdate::Demand(pool))
}
