// simulator/src/main.rs

//! Simulator binary.
//!
//! Runs the fee-market model for every configured mechanism and run,
//! prints one JSON summary per run on stdout and optionally writes the
//! per-step history and a Prometheus metrics dump.

mod config;
mod experiment;
mod report;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::signal;

use feemarket::MetricsRegistry;

use config::{Cli, SimulatorConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "simulator=info,feemarket=info".to_string()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        tracing::error!("fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = SimulatorConfig::from_cli(&cli).await?;

    tracing::info!(
        mechanisms = ?cfg.mechanisms,
        runs = cfg.simulation.runs,
        timesteps = cfg.simulation.timesteps,
        seed = cfg.simulation.seed,
        admission = ?cfg.admission,
        "simulator configured"
    );

    let metrics = if cli.metrics {
        Some(Arc::new(
            MetricsRegistry::new().context("failed to initialise metrics registry")?,
        ))
    } else {
        None
    };

    let specs = experiment::plan(&cfg);
    let outcomes = tokio::select! {
        res = experiment::run_all(specs, metrics.clone()) => res?,
        _ = signal::ctrl_c() => bail!("interrupted"),
    };

    report::write_summaries(std::io::stdout().lock(), &outcomes)?;

    if let Some(path) = &cli.history {
        report::write_history(path, &outcomes).await?;
    }

    if let Some(metrics) = metrics {
        eprint!("{}", metrics.gather_text());
    }

    Ok(())
}
