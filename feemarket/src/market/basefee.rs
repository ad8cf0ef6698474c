//! Base-fee adjustment.
//!
//! Proportional control on block fullness:
//!
//! ```text
//! new = old + old * (used - target) / target / max_change_denominator
//! ```
//!
//! Both divisions round towards negative infinity, so a block below target
//! always lowers a positive base fee by at least one wei. The result is
//! clamped to `min_basefee` (zero by default) so it can never go negative.

use crate::config::Eip1559Params;
use crate::error::StepError;
use crate::state::{PolicyOutput, StateUpdate, StepContext};
use crate::types::{Gas, Wei};

/// Computes the base fee that follows a block which used `gas_used`.
pub fn next_basefee(
    params: &Eip1559Params,
    parent_basefee: Wei,
    gas_used: Gas,
) -> Result<Wei, StepError> {
    params.validate()?;

    let target = i128::from(params.target_size);
    let denominator = i128::from(params.basefee_max_change_denominator);
    let parent = i128::from(parent_basefee);

    let delta = parent
        .checked_mul(i128::from(gas_used) - target)
        .ok_or(StepError::FeeOverflow("scaling base fee delta"))?;
    let step = delta.div_euclid(target).div_euclid(denominator);

    let next = (parent + step).max(i128::from(params.min_basefee));
    Wei::try_from(next).map_err(|_| StepError::FeeOverflow("applying base fee delta"))
}

/// Updates `basefee` from the gas used by the block the policy produced.
pub fn update_basefee(
    ctx: &StepContext<'_>,
    policy: &PolicyOutput,
) -> Result<StateUpdate, StepError> {
    let basefee = ctx.state.basefee()?;
    let gas_used = policy.block.gas_used()?;
    let next = next_basefee(&ctx.params.eip1559, basefee, gas_used)?;

    tracing::trace!(
        timestep = ctx.timestep,
        gas_used,
        target = ctx.params.eip1559.target_size,
        from = basefee,
        to = next,
        "updated base fee"
    );

    Ok(StateUpdate::Basefee(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MarketConfig, Mechanism};
    use crate::error::ConfigError;
    use crate::state::{SimState, StateKey};
    use crate::types::{Block, GWEI, LegacyTx, Transaction, TxHash};

    fn params() -> Eip1559Params {
        Eip1559Params::default()
    }

    #[test]
    fn full_block_raises_by_one_eighth() {
        let next = next_basefee(&params(), GWEI, 25_000_000).expect("valid params");
        assert_eq!(next, 1_125_000_000);
    }

    #[test]
    fn empty_block_lowers_by_one_eighth() {
        let next = next_basefee(&params(), GWEI, 0).expect("valid params");
        assert_eq!(next, 875_000_000);
    }

    #[test]
    fn target_block_keeps_basefee() {
        let next = next_basefee(&params(), GWEI, 12_500_000).expect("valid params");
        assert_eq!(next, GWEI);
    }

    // Above target the update can only be non-negative: floor division
    // turns a positive delta below one wei into zero, so small base fees
    // may stay flat. See `small_basefee_stays_flat_just_above_target`.
    #[test]
    fn direction_follows_utilisation() {
        let p = params();
        for basefee in [1, 7, 1_000, GWEI, 40 * GWEI] {
            for used in [0, 1, 6_000_000, 12_499_999] {
                assert!(next_basefee(&p, basefee, used).expect("valid") < basefee);
            }
            for used in [12_500_001, 20_000_000, 25_000_000, 40_000_000] {
                assert!(next_basefee(&p, basefee, used).expect("valid") >= basefee);
            }
            assert_eq!(next_basefee(&p, basefee, 12_500_000).expect("valid"), basefee);
        }
    }

    #[test]
    fn small_basefee_stays_flat_just_above_target() {
        let p = params();
        // 1 * 1 / 12_500_000 floors to 0, so the fee does not move.
        assert_eq!(next_basefee(&p, 1, 12_500_001).expect("valid"), 1);
        // 7 * 12_500_000 / 12_500_000 / 8 floors to 0 as well.
        assert_eq!(next_basefee(&p, 7, 25_000_000).expect("valid"), 7);
        // Once the delta reaches a whole wei the increase is strict.
        assert_eq!(next_basefee(&p, 8, 25_000_000).expect("valid"), 9);
    }

    #[test]
    fn realistic_basefee_strictly_increases_above_target() {
        let p = params();
        for used in [12_500_001, 20_000_000, 25_000_000] {
            assert!(next_basefee(&p, GWEI, used).expect("valid") > GWEI);
        }
    }

    // Rounding towards negative infinity: a tiny shortfall on a small base
    // fee still costs one wei rather than truncating to zero.
    #[test]
    fn rounding_floors_negative_deltas() {
        let next = next_basefee(&params(), 10, 12_499_999).expect("valid params");
        assert_eq!(next, 9);
    }

    #[test]
    fn basefee_never_drops_below_floor() {
        let mut p = params();
        assert_eq!(next_basefee(&p, 0, 0).expect("valid"), 0);
        assert_eq!(next_basefee(&p, 1, 0).expect("valid"), 0);

        p.min_basefee = 7;
        assert_eq!(next_basefee(&p, 7, 0).expect("valid"), 7);
    }

    #[test]
    fn zero_target_is_a_config_error() {
        let mut p = params();
        p.target_size = 0;
        let err = next_basefee(&p, GWEI, 0).unwrap_err();
        assert!(matches!(err, StepError::Config(ConfigError::ZeroTarget)));
    }

    #[test]
    fn huge_basefee_overflow_is_reported() {
        let err = next_basefee(&params(), u64::MAX, 25_000_000).unwrap_err();
        assert!(matches!(err, StepError::FeeOverflow(_)));
    }

    #[test]
    fn update_uses_admitted_gas() {
        let cfg = MarketConfig::for_mechanism(Mechanism::Eip1559);
        let state = SimState::initial(&cfg);
        let ctx = StepContext::detached(&cfg, &state);

        // `size` is inflated as the reference admission loop would leave it;
        // only the admitted transactions' gas drives the update.
        let tx = Transaction::Legacy(LegacyTx {
            hash: TxHash::derive(0, 0, 0),
            gas_used: 12_500_000,
            fee: GWEI,
        });
        let policy = PolicyOutput {
            block: Block {
                size: 40_000_000,
                txs: vec![tx],
            },
            underpriced: 0,
        };

        let update = update_basefee(&ctx, &policy).expect("update");
        assert_eq!(update, StateUpdate::Basefee(GWEI));
    }

    #[test]
    fn update_requires_basefee_in_state() {
        let cfg = MarketConfig::for_mechanism(Mechanism::Eip1559);
        let state = SimState::default();
        let ctx = StepContext::detached(&cfg, &state);

        let err = update_basefee(&ctx, &PolicyOutput::default()).unwrap_err();
        assert!(matches!(err, StepError::MissingState(StateKey::Basefee)));
    }
}
