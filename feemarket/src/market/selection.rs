//! Transaction selection.
//!
//! The selector ranks the demand pool by what each transaction pays the
//! block producer and packs the ranking into a block under the active
//! mechanism's gas limit:
//!
//! - EIP-1559: score is `min(premium, fee_cap - basefee)`; transactions
//!   whose cap is below the base fee are not candidates at all.
//! - Legacy: score is the flat fee; every transaction is a candidate.
//!
//! Ties are broken by transaction hash so the block is a deterministic
//! function of the pool.

use crate::config::{AdmissionPolicy, Mechanism};
use crate::error::StepError;
use crate::state::{PolicyOutput, StepContext};
use crate::types::{Block, Eip1559Tx, Gas, Transaction, Wei};

/// A ranked candidate.
#[derive(Clone, Copy, Debug)]
struct Candidate<'a> {
    score: Wei,
    tx: &'a Transaction,
}

/// Per-gas amount an EIP-1559 transaction pays the producer at `basefee`.
///
/// Returns `None` if the fee cap does not cover the base fee.
pub fn effective_priority_fee(tx: &Eip1559Tx, basefee: Wei) -> Option<Wei> {
    let headroom = tx.fee_cap.checked_sub(basefee)?;
    Some(tx.premium.min(headroom))
}

/// Runs the selector of the configured mechanism.
pub fn select_transactions(ctx: &StepContext<'_>) -> Result<PolicyOutput, StepError> {
    match ctx.params.mechanism {
        Mechanism::Legacy => select_legacy(ctx),
        Mechanism::Eip1559 => select_eip1559(ctx),
    }
}

/// Builds a block from an EIP-1559 demand pool at the current base fee.
pub fn select_eip1559(ctx: &StepContext<'_>) -> Result<PolicyOutput, StepError> {
    let demand = ctx.state.demand()?;
    let basefee = ctx.state.basefee()?;

    let mut candidates = Vec::with_capacity(demand.len());
    let mut underpriced = 0usize;
    for tx in demand.values() {
        let Transaction::Eip1559(inner) = tx else {
            return Err(mismatch(tx, Mechanism::Eip1559));
        };
        match effective_priority_fee(inner, basefee) {
            Some(score) => candidates.push(Candidate { score, tx }),
            None => underpriced += 1,
        }
    }

    let block = pack_block(
        candidates,
        ctx.params.eip1559.max_block_size,
        ctx.params.admission,
    )?;

    tracing::debug!(
        timestep = ctx.timestep,
        basefee,
        included = block.len(),
        underpriced,
        size = block.size,
        "selected eip1559 block"
    );

    Ok(PolicyOutput { block, underpriced })
}

/// Builds a block from a legacy demand pool.
pub fn select_legacy(ctx: &StepContext<'_>) -> Result<PolicyOutput, StepError> {
    let demand = ctx.state.demand()?;

    let mut candidates = Vec::with_capacity(demand.len());
    for tx in demand.values() {
        let Transaction::Legacy(inner) = tx else {
            return Err(mismatch(tx, Mechanism::Legacy));
        };
        candidates.push(Candidate {
            score: inner.fee,
            tx,
        });
    }

    let block = pack_block(
        candidates,
        ctx.params.legacy.max_block_size,
        ctx.params.admission,
    )?;

    tracing::debug!(
        timestep = ctx.timestep,
        included = block.len(),
        size = block.size,
        "selected legacy block"
    );

    Ok(PolicyOutput {
        block,
        underpriced: 0,
    })
}

fn mismatch(tx: &Transaction, expected: Mechanism) -> StepError {
    StepError::MechanismMismatch {
        hash: tx.hash(),
        expected,
        found: tx.mechanism(),
    }
}

/// Sorts `candidates` and admits them greedily under `max_block_size`.
fn pack_block(
    mut candidates: Vec<Candidate<'_>>,
    max_block_size: Gas,
    policy: AdmissionPolicy,
) -> Result<Block, StepError> {
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.tx.hash().cmp(&b.tx.hash()))
    });

    let mut size: Gas = 0;
    let mut txs = Vec::new();

    for candidate in candidates {
        let gas = candidate.tx.gas_used();
        match policy {
            AdmissionPolicy::CheckBeforeAdd => {
                if size < max_block_size {
                    txs.push(candidate.tx.clone());
                }
                // Counted whether or not it was admitted.
                size = size
                    .checked_add(gas)
                    .ok_or(StepError::GasOverflow("packing block"))?;
            }
            AdmissionPolicy::StrictFit => {
                let next = size
                    .checked_add(gas)
                    .ok_or(StepError::GasOverflow("packing block"))?;
                if next <= max_block_size {
                    txs.push(candidate.tx.clone());
                    size = next;
                }
            }
        }
    }

    Ok(Block { size, txs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarketConfig;
    use crate::state::{DemandPool, SimState, StateKey};
    use crate::types::{GWEI, LegacyTx, TxHash};

    fn eip_tx(index: u64, gas_used: Gas, fee_cap: Wei, premium: Wei) -> Transaction {
        Transaction::Eip1559(Eip1559Tx {
            hash: TxHash::derive(1, index, 0),
            gas_used,
            fee_cap,
            premium,
        })
    }

    fn legacy_tx(index: u64, gas_used: Gas, fee: Wei) -> Transaction {
        Transaction::Legacy(LegacyTx {
            hash: TxHash::derive(1, index, 0),
            gas_used,
            fee,
        })
    }

    fn pool(txs: Vec<Transaction>) -> DemandPool {
        txs.into_iter().map(|tx| (tx.hash(), tx)).collect()
    }

    fn state_with(demand: DemandPool, basefee: Option<Wei>) -> SimState {
        SimState {
            mempool_length: Some(demand.len()),
            basefee,
            demand: Some(demand),
            latest_block: None,
        }
    }

    fn run(cfg: &MarketConfig, state: &SimState) -> Result<PolicyOutput, StepError> {
        select_transactions(&StepContext::detached(cfg, state))
    }

    #[test]
    fn effective_fee_is_capped_by_headroom() {
        let tx = Eip1559Tx {
            hash: TxHash::derive(0, 0, 0),
            gas_used: 21_000,
            fee_cap: 5 * GWEI,
            premium: 3 * GWEI,
        };
        assert_eq!(effective_priority_fee(&tx, GWEI), Some(3 * GWEI));
        assert_eq!(effective_priority_fee(&tx, 4 * GWEI), Some(GWEI));
        assert_eq!(effective_priority_fee(&tx, 5 * GWEI), Some(0));
        assert_eq!(effective_priority_fee(&tx, 6 * GWEI), None);
    }

    #[test]
    fn empty_demand_yields_empty_block() {
        for mechanism in [Mechanism::Legacy, Mechanism::Eip1559] {
            let cfg = MarketConfig::for_mechanism(mechanism);
            let state = state_with(DemandPool::new(), Some(GWEI));
            let out = run(&cfg, &state).expect("selection");
            assert!(out.block.is_empty());
            assert_eq!(out.block.size, 0);
        }
    }

    #[test]
    fn eip1559_excludes_transactions_below_basefee() {
        let cfg = MarketConfig::for_mechanism(Mechanism::Eip1559);
        let demand = pool(vec![
            eip_tx(0, 21_000, 2 * GWEI, GWEI),
            eip_tx(1, 21_000, 5 * GWEI, GWEI),
            eip_tx(2, 21_000, 3 * GWEI, GWEI),
        ]);
        let state = state_with(demand, Some(3 * GWEI));

        let out = run(&cfg, &state).expect("selection");
        assert_eq!(out.underpriced, 1);
        assert_eq!(out.block.len(), 2);
        assert!(!out.block.contains(&TxHash::derive(1, 0, 0)));
        // fee_cap == basefee is still eligible.
        assert!(out.block.contains(&TxHash::derive(1, 2, 0)));
    }

    #[test]
    fn eip1559_ranks_by_effective_priority_fee() {
        let cfg = MarketConfig::for_mechanism(Mechanism::Eip1559);
        let demand = pool(vec![
            // headroom 1 gwei caps a 3 gwei premium
            eip_tx(0, 21_000, 3 * GWEI, 3 * GWEI),
            eip_tx(1, 21_000, 7 * GWEI, 2 * GWEI),
            eip_tx(2, 21_000, 7 * GWEI, 3 * GWEI),
        ]);
        let state = state_with(demand, Some(2 * GWEI));

        let out = run(&cfg, &state).expect("selection");
        let order: Vec<TxHash> = out.block.txs.iter().map(Transaction::hash).collect();
        assert_eq!(
            order,
            vec![
                TxHash::derive(1, 2, 0),
                TxHash::derive(1, 1, 0),
                TxHash::derive(1, 0, 0)
            ]
        );
    }

    #[test]
    fn ties_are_broken_by_hash() {
        let cfg = MarketConfig::for_mechanism(Mechanism::Legacy);
        let txs: Vec<Transaction> = (0..10).map(|i| legacy_tx(i, 21_000, 3 * GWEI)).collect();
        let mut expected: Vec<TxHash> = txs.iter().map(Transaction::hash).collect();
        expected.sort();

        let state = state_with(pool(txs), None);
        let out = run(&cfg, &state).expect("selection");
        let order: Vec<TxHash> = out.block.txs.iter().map(Transaction::hash).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn legacy_never_excludes_on_fee() {
        let cfg = MarketConfig::for_mechanism(Mechanism::Legacy);
        let demand = pool(vec![
            legacy_tx(0, 21_000, 1),
            legacy_tx(1, 21_000, 0),
            legacy_tx(2, 21_000, 7 * GWEI),
        ]);
        let state = state_with(demand, None);

        let out = run(&cfg, &state).expect("selection");
        assert_eq!(out.block.len(), 3);
        assert_eq!(out.underpriced, 0);
        assert_eq!(out.block.txs[0].hash(), TxHash::derive(1, 2, 0));
    }

    // The reference admission loop checks the limit before adding, so the
    // transaction that crosses the limit is still admitted, and every
    // later candidate's gas still counts towards `size`.
    #[test]
    fn check_before_add_admits_one_past_the_limit() {
        let mut cfg = MarketConfig::for_mechanism(Mechanism::Legacy);
        cfg.legacy.max_block_size = 50_000;
        let demand = pool(vec![
            legacy_tx(0, 30_000, 5 * GWEI),
            legacy_tx(1, 30_000, 4 * GWEI),
            legacy_tx(2, 30_000, 3 * GWEI),
        ]);
        let state = state_with(demand, None);

        let out = run(&cfg, &state).expect("selection");
        assert_eq!(out.block.len(), 2);
        assert_eq!(out.block.gas_used().expect("no overflow"), 60_000);
        assert_eq!(out.block.size, 90_000);
        assert!(
            out.block.gas_used().expect("no overflow")
                <= cfg.legacy.max_block_size + out.block.max_tx_gas()
        );
    }

    #[test]
    fn strict_fit_never_exceeds_the_limit() {
        let mut cfg = MarketConfig::for_mechanism(Mechanism::Legacy);
        cfg.legacy.max_block_size = 50_000;
        cfg.admission = AdmissionPolicy::StrictFit;
        let demand = pool(vec![
            legacy_tx(0, 30_000, 5 * GWEI),
            legacy_tx(1, 30_000, 4 * GWEI),
            legacy_tx(2, 20_000, 3 * GWEI),
        ]);
        let state = state_with(demand, None);

        let out = run(&cfg, &state).expect("selection");
        // The second 30k candidate does not fit, the 20k one behind it does.
        assert_eq!(out.block.len(), 2);
        assert_eq!(out.block.size, 50_000);
        assert_eq!(out.block.gas_used().expect("no overflow"), 50_000);
        assert!(!out.block.contains(&TxHash::derive(1, 1, 0)));
    }

    #[test]
    fn mixed_pool_is_rejected() {
        let cfg = MarketConfig::for_mechanism(Mechanism::Eip1559);
        let demand = pool(vec![legacy_tx(0, 21_000, GWEI)]);
        let state = state_with(demand, Some(GWEI));

        let err = run(&cfg, &state).unwrap_err();
        assert!(matches!(
            err,
            StepError::MechanismMismatch {
                expected: Mechanism::Eip1559,
                found: Mechanism::Legacy,
                ..
            }
        ));
    }

    #[test]
    fn missing_basefee_fails_fast() {
        let cfg = MarketConfig::for_mechanism(Mechanism::Eip1559);
        let state = state_with(DemandPool::new(), None);
        let err = run(&cfg, &state).unwrap_err();
        assert!(matches!(err, StepError::MissingState(StateKey::Basefee)));
    }

    #[test]
    fn gas_overflow_is_fatal() {
        let cfg = MarketConfig::for_mechanism(Mechanism::Legacy);
        let demand = pool(vec![
            legacy_tx(0, u64::MAX, 2 * GWEI),
            legacy_tx(1, 1, GWEI),
        ]);
        let state = state_with(demand, None);
        let err = run(&cfg, &state).unwrap_err();
        assert!(matches!(err, StepError::GasOverflow(_)));
    }
}
