//! Planning and parallel execution of simulation runs.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinSet;

use feemarket::{
    DefaultEngine, HistoryStore, MarketConfig, Mechanism, MetricsRegistry, RunSummary, StepError,
    StepRecord, step_records,
};

use crate::config::SimulatorConfig;

/// One independent run of one mechanism.
#[derive(Clone, Debug)]
pub struct RunSpec {
    pub run: usize,
    pub seed: u64,
    pub timesteps: u64,
    pub market: MarketConfig,
}

impl RunSpec {
    pub fn mechanism(&self) -> Mechanism {
        self.market.mechanism
    }
}

/// Result of a completed run.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub records: Vec<StepRecord>,
}

/// Plans every (mechanism, run) pair.
///
/// Run `r` of every mechanism shares the seed `seed + r`. Demand draws the
/// same gas and hashes under either mechanism for a given seed, so the
/// mechanisms are compared on the same transactions.
pub fn plan(cfg: &SimulatorConfig) -> Vec<RunSpec> {
    let sim = &cfg.simulation;
    cfg.mechanisms
        .iter()
        .flat_map(|&mechanism| {
            (0..sim.runs).map(move |run| RunSpec {
                run,
                seed: sim.run_seed(run),
                timesteps: sim.timesteps,
                market: cfg.market_config(mechanism),
            })
        })
        .collect()
}

/// Drives one run to completion on the current thread.
pub fn execute(
    spec: RunSpec,
    metrics: Option<Arc<MetricsRegistry>>,
) -> Result<RunOutcome, StepError> {
    let mut engine = DefaultEngine::with_defaults(spec.market, spec.run, spec.seed)?;
    if let Some(metrics) = metrics {
        engine = engine.with_metrics(metrics);
    }
    engine.run(spec.timesteps)?;

    let records = step_records(engine.store().snapshots())?;
    let summary =
        RunSummary::from_records(engine.config(), engine.run_index(), engine.seed(), &records);
    Ok(RunOutcome { summary, records })
}

/// Runs every planned run on the blocking pool and returns the outcomes ordered by
/// mechanism, then run index.
pub async fn run_all(
    specs: Vec<RunSpec>,
    metrics: Option<Arc<MetricsRegistry>>,
) -> Result<Vec<RunOutcome>> {
    tracing::info!(runs = specs.len(), "starting simulation runs");

    let mut tasks = JoinSet::new();
    for spec in specs {
        let metrics = metrics.clone();
        tasks.spawn_blocking(move || {
            let label = format!("{} run {}", spec.mechanism(), spec.run);
            execute(spec, metrics).with_context(|| format!("{label} failed"))
        });
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.context("simulation task panicked")??;
        outcomes.push(outcome);
    }

    outcomes.sort_by_key(|o| (o.summary.mechanism, o.summary.run));
    Ok(outcomes)
}
