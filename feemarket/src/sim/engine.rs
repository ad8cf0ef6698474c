//! Simulation engine.
//!
//! The engine wires together:
//!
//! - a [`Model`] of substeps for the configured mechanism,
//! - a [`HistoryStore`] receiving one snapshot per substep,
//! - a [`BlockValidator`] run over every produced block,
//! - a seeded random source owned by this run alone,
//! - optional shared [`MetricsRegistry`].
//!
//! Engines hold no global state, so independent runs can be driven from
//! different threads.

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};

use crate::config::MarketConfig;
use crate::error::StepError;
use crate::market::generate_demand;
use crate::metrics::MetricsRegistry;
use crate::state::{PolicyOutput, SimState, StateSnapshot, StepContext};
use crate::storage::HistoryStore;
use crate::types::Gas;
use crate::validation::BlockValidator;

use super::model::{Model, Substep};

/// Fully-configurable simulation engine for a single run.
///
/// Generic over:
///
/// - `S`: history backend implementing [`HistoryStore`],
/// - `V`: block validator implementing [`BlockValidator`].
pub struct SimulationEngine<S, V> {
    config: MarketConfig,
    model: Model,
    store: S,
    validator: V,
    rng: StdRng,
    state: SimState,
    timestep: u64,
    run: usize,
    seed: u64,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl<S, V> SimulationEngine<S, V>
where
    S: HistoryStore,
    V: BlockValidator,
{
    /// Creates the engine for run 0.
    pub fn new(config: MarketConfig, store: S, validator: V, seed: u64) -> Result<Self, StepError> {
        Self::for_run(config, store, validator, 0, seed)
    }

    /// Creates the engine for run `run`, seeded with `seed`, and records
    /// the initial state as timestep 0.
    pub fn for_run(
        config: MarketConfig,
        store: S,
        validator: V,
        run: usize,
        seed: u64,
    ) -> Result<Self, StepError> {
        config.validate()?;

        let model = Model::for_mechanism(config.mechanism);
        let state = SimState::initial(&config);
        let mut engine = Self {
            config,
            model,
            store,
            validator,
            rng: StdRng::seed_from_u64(seed),
            state,
            timestep: 0,
            run,
            seed,
            metrics: None,
        };
        engine.record(0);
        Ok(engine)
    }

    /// Reports every produced block to `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// State after the last completed substep.
    pub fn state(&self) -> &SimState {
        &self.state
    }

    /// Last completed timestep, 0 before the first step.
    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    pub fn run_index(&self) -> usize {
        self.run
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs every substep of the next timestep.
    ///
    /// Substeps work on a scratch copy of the state. State, timestep and
    /// history are committed only once the whole timestep has succeeded,
    /// so a failed step leaves them as they were. The random source is not
    /// rewound.
    pub fn step(&mut self) -> Result<(), StepError> {
        let timestep = self.timestep + 1;
        let mut state = self.state.clone();
        let mut staged = Vec::with_capacity(self.model.substeps().len());
        let mut produced: Option<PolicyOutput> = None;

        for (index, substep) in self.model.substeps().iter().enumerate() {
            let substep_no = index + 1;

            let updates = {
                let ctx = StepContext {
                    params: &self.config,
                    timestep,
                    substep: substep_no,
                    history: self.store.snapshots(),
                    state: &state,
                };
                match substep {
                    Substep::Demand => vec![generate_demand(&ctx, &mut self.rng)?],
                    Substep::Block { policy, updates } => {
                        let output = policy(&ctx)?;
                        self.validator.validate(&output.block, &state)?;
                        let results = updates
                            .iter()
                            .map(|update| update(&ctx, &output))
                            .collect::<Result<Vec<_>, _>>()?;
                        produced = Some(output);
                        results
                    }
                }
            };

            for update in updates {
                state.apply(update);
            }
            staged.push(StateSnapshot {
                run: self.run,
                timestep,
                substep: substep_no,
                state: state.clone(),
            });
        }

        let gas_used = produced
            .as_ref()
            .map(|output| output.block.gas_used())
            .transpose()?;

        self.state = state;
        self.timestep = timestep;
        for snapshot in staged {
            self.store.push(snapshot);
        }
        if let (Some(output), Some(gas_used)) = (produced, gas_used) {
            self.observe(&output, gas_used);
        }

        Ok(())
    }

    /// Runs `timesteps` consecutive timesteps.
    pub fn run(&mut self, timesteps: u64) -> Result<(), StepError> {
        for _ in 0..timesteps {
            self.step()?;
        }

        tracing::info!(
            run = self.run,
            seed = self.seed,
            mechanism = %self.config.mechanism,
            timesteps,
            basefee = ?self.state.basefee,
            "run complete"
        );
        Ok(())
    }

    fn observe(&self, output: &PolicyOutput, gas_used: Gas) {
        let utilisation = gas_used as f64 / self.config.utilisation_target() as f64;

        tracing::debug!(
            run = self.run,
            timestep = self.timestep,
            block = %output.block.compute_hash().0,
            included = output.block.len(),
            gas_used,
            utilisation,
            basefee = ?self.state.basefee,
            "block produced"
        );

        if let Some(metrics) = &self.metrics {
            let mechanism = self.config.mechanism;
            metrics
                .market
                .observe_block(mechanism, output.block.len(), output.underpriced, gas_used);
            metrics
                .market
                .set_run_gauges(mechanism, self.run, self.state.basefee, utilisation);
        }
    }

    fn record(&mut self, substep: usize) {
        self.store.push(StateSnapshot {
            run: self.run,
            timestep: self.timestep,
            substep,
            state: self.state.clone(),
        });
    }
}
