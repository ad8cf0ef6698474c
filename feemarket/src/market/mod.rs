//! Step functions of the fee-market model.
//!
//! Each function is a pure transform over a [`StepContext`]:
//!
//! - [`demand::generate_demand`] synthesizes the pending pool,
//! - [`selection::select_transactions`] packs the pool into a block (the
//!   policy of the block substep),
//! - [`basefee::update_basefee`] adjusts the EIP-1559 base fee,
//! - [`recorder::record_latest_block`] stores the produced block.
//!
//! [`StepContext`]: crate::state::StepContext

pub mod basefee;
pub mod demand;
pub mod recorder;
pub mod selection;

pub use basefee::{next_basefee, update_basefee};
pub use demand::generate_demand;
pub use recorder::record_latest_block;
pub use selection::{effective_priority_fee, select_eip1559, select_legacy, select_transactions};
