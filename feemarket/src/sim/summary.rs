//! Per-step records and per-run summary statistics derived from history.

use serde::Serialize;

use crate::config::{MarketConfig, Mechanism};
use crate::error::StepError;
use crate::state::StateSnapshot;
use crate::types::{Gas, Wei};

/// State at the end of one timestep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub run: usize,
    pub timestep: u64,
    /// Base fee after the step's update, absent under the legacy auction.
    pub basefee: Option<Wei>,
    pub gas_used: Gas,
    pub included: usize,
    pub demand: usize,
}

/// Extracts one record per completed timestep.
///
/// Uses the last snapshot recorded for each timestep and skips the initial
/// state at timestep 0. Snapshots must be in recording order.
pub fn step_records(history: &[StateSnapshot]) -> Result<Vec<StepRecord>, StepError> {
    let mut records = Vec::new();
    for (i, snapshot) in history.iter().enumerate() {
        if snapshot.timestep == 0 {
            continue;
        }
        let last_of_step = history
            .get(i + 1)
            .is_none_or(|next| next.timestep != snapshot.timestep);
        if !last_of_step {
            continue;
        }

        let state = &snapshot.state;
        let block = state.latest_block()?;
        records.push(StepRecord {
            run: snapshot.run,
            timestep: snapshot.timestep,
            basefee: state.basefee,
            gas_used: block.gas_used()?,
            included: block.len(),
            demand: state.demand()?.len(),
        });
    }
    Ok(records)
}

/// Summary statistics of one run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub mechanism: Mechanism,
    pub run: usize,
    pub seed: u64,
    pub timesteps: usize,
    pub mean_gas_used: f64,
    pub max_gas_used: Gas,
    pub mean_included: f64,
    /// Mean of gas used over the EIP-1559 target, or over the legacy limit.
    pub mean_utilisation: f64,
    pub final_basefee: Option<Wei>,
    pub min_basefee: Option<Wei>,
    pub max_basefee: Option<Wei>,
}

impl RunSummary {
    /// Summarises `records` of a run driven under `config`.
    pub fn from_records(
        config: &MarketConfig,
        run: usize,
        seed: u64,
        records: &[StepRecord],
    ) -> Self {
        let n = records.len();
        let mean = |total: f64| if n == 0 { 0.0 } else { total / n as f64 };

        let total_gas: f64 = records.iter().map(|r| r.gas_used as f64).sum();
        let total_included: f64 = records.iter().map(|r| r.included as f64).sum();
        let target = config.utilisation_target() as f64;

        let basefees = records.iter().filter_map(|r| r.basefee);

        Self {
            mechanism: config.mechanism,
            run,
            seed,
            timesteps: n,
            mean_gas_used: mean(total_gas),
            max_gas_used: records.iter().map(|r| r.gas_used).max().unwrap_or(0),
            mean_included: mean(total_included),
            mean_utilisation: mean(total_gas) / target,
            final_basefee: records.last().and_then(|r| r.basefee),
            min_basefee: basefees.clone().min(),
            max_basefee: basefees.max(),
        }
    }

    /// Summarises a run directly from its recorded history.
    pub fn from_history(
        config: &MarketConfig,
        run: usize,
        seed: u64,
        history: &[StateSnapshot],
    ) -> Result<Self, StepError> {
        let records = step_records(history)?;
        Ok(Self::from_records(config, run, seed, &records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulationEngine;
    use crate::state::SimState;
    use crate::storage::{HistoryStore, InMemoryHistory};
    use crate::types::GWEI;
    use crate::validation::AcceptAllValidator;

    fn record(timestep: u64, basefee: Option<Wei>, gas_used: Gas) -> StepRecord {
        StepRecord {
            run: 0,
            timestep,
            basefee,
            gas_used,
            included: 10,
            demand: 10,
        }
    }

    #[test]
    fn records_follow_engine_steps() {
        let cfg = MarketConfig::for_mechanism(Mechanism::Eip1559);
        let mut engine =
            SimulationEngine::new(cfg, InMemoryHistory::new(), AcceptAllValidator, 9)
                .expect("valid");
        engine.run(6).expect("run");

        let records = step_records(engine.store().snapshots()).expect("records");
        let steps: Vec<u64> = records.iter().map(|r| r.timestep).collect();
        assert_eq!(steps, vec![1, 2, 3, 4, 5, 6]);
        assert!(records.iter().all(|r| r.included == 100 && r.demand == 100));
        assert_eq!(
            records.last().and_then(|r| r.basefee),
            engine.state().basefee
        );
    }

    #[test]
    fn initial_state_alone_has_no_records() {
        let snapshot = StateSnapshot {
            run: 0,
            timestep: 0,
            substep: 0,
            state: SimState::default(),
        };
        assert!(step_records(&[snapshot]).expect("records").is_empty());
    }

    #[test]
    fn incomplete_step_reports_missing_block() {
        let snapshot = StateSnapshot {
            run: 0,
            timestep: 1,
            substep: 1,
            state: SimState::default(),
        };
        assert!(matches!(
            step_records(&[snapshot]),
            Err(StepError::MissingState(_))
        ));
    }

    #[test]
    fn summary_statistics() {
        let cfg = MarketConfig::for_mechanism(Mechanism::Eip1559);
        let records = vec![
            record(1, Some(GWEI), 2_500_000),
            record(2, Some(900_000_000), 12_500_000),
            record(3, Some(950_000_000), 10_000_000),
        ];

        let summary = RunSummary::from_records(&cfg, 1, 11, &records);
        assert_eq!(summary.timesteps, 3);
        assert_eq!(summary.max_gas_used, 12_500_000);
        assert!((summary.mean_gas_used - 25_000_000.0 / 3.0).abs() < 1e-6);
        assert!((summary.mean_utilisation - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.final_basefee, Some(950_000_000));
        assert_eq!(summary.min_basefee, Some(900_000_000));
        assert_eq!(summary.max_basefee, Some(GWEI));
    }

    #[test]
    fn legacy_summary_has_no_basefee() {
        let cfg = MarketConfig::for_mechanism(Mechanism::Legacy);
        let records = vec![record(1, None, 12_500_000)];
        let summary = RunSummary::from_records(&cfg, 0, 0, &records);
        assert_eq!(summary.mean_utilisation, 1.0);
        assert!(summary.final_basefee.is_none());
        assert!(summary.min_basefee.is_none());

        let json = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(json["mechanism"], "legacy");
    }

    #[test]
    fn empty_run_summarises_to_zero() {
        let cfg = MarketConfig::default();
        let summary = RunSummary::from_history(&cfg, 0, 0, &[]).expect("summary");
        assert_eq!(summary.timesteps, 0);
        assert_eq!(summary.mean_gas_used, 0.0);
        assert_eq!(summary.max_gas_used, 0);
    }
}
