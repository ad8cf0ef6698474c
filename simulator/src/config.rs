//! Runner configuration.
//!
//! Settings come from an optional TOML file and are then overridden by
//! command-line flags. Every TOML section is optional:
//!
//! ```toml
//! mechanisms = ["legacy", "eip1559"]
//! admission = "check_before_add"
//!
//! [simulation]
//! timesteps = 100
//! runs = 4
//! seed = 7
//!
//! [demand]
//! mempool_length = 200
//!
//! [eip1559]
//! target_size = 12500000
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use feemarket::{
    AdmissionPolicy, DemandParams, Eip1559Params, LegacyParams, MarketConfig, Mechanism,
    SimulationConfig,
};

/// Command-line arguments.
#[derive(Parser, Debug, Default)]
#[command(name = "simulator", version, about)]
pub struct Cli {
    /// TOML file with simulation parameters.
    #[clap(long, short, env = "FEEMARKET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Mechanisms to simulate.
    #[clap(long, short, value_enum)]
    pub mechanism: Option<MechanismArg>,

    /// Timesteps per run.
    #[clap(long, short)]
    pub timesteps: Option<u64>,

    /// Independent runs per mechanism.
    #[clap(long, short)]
    pub runs: Option<usize>,

    /// Base seed; run `r` uses `seed + r`.
    #[clap(long, short)]
    pub seed: Option<u64>,

    /// Transactions generated per timestep.
    #[clap(long)]
    pub mempool_length: Option<usize>,

    /// Block admission rule.
    #[clap(long, value_enum)]
    pub admission: Option<AdmissionArg>,

    /// Write per-step records as JSON lines to this file.
    #[clap(long)]
    pub history: Option<PathBuf>,

    /// Print Prometheus metrics to stderr after the runs.
    #[clap(long)]
    pub metrics: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MechanismArg {
    Legacy,
    Eip1559,
    Both,
}

impl MechanismArg {
    pub fn mechanisms(self) -> Vec<Mechanism> {
        match self {
            MechanismArg::Legacy => vec![Mechanism::Legacy],
            MechanismArg::Eip1559 => vec![Mechanism::Eip1559],
            MechanismArg::Both => vec![Mechanism::Legacy, Mechanism::Eip1559],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AdmissionArg {
    CheckBeforeAdd,
    StrictFit,
}

impl From<AdmissionArg> for AdmissionPolicy {
    fn from(arg: AdmissionArg) -> Self {
        match arg {
            AdmissionArg::CheckBeforeAdd => AdmissionPolicy::CheckBeforeAdd,
            AdmissionArg::StrictFit => AdmissionPolicy::StrictFit,
        }
    }
}

/// Everything needed to plan and run an experiment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub mechanisms: Vec<Mechanism>,
    pub admission: AdmissionPolicy,
    pub simulation: SimulationConfig,
    pub demand: DemandParams,
    pub eip1559: Eip1559Params,
    pub legacy: LegacyParams,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            mechanisms: vec![Mechanism::Legacy, Mechanism::Eip1559],
            admission: AdmissionPolicy::default(),
            simulation: SimulationConfig::default(),
            demand: DemandParams::default(),
            eip1559: Eip1559Params::default(),
            legacy: LegacyParams::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).context("invalid simulator config")
    }

    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&s).with_context(|| format!("in {}", path.display()))
    }

    /// Loads the file named by `cli`, if any, and applies the flag overrides.
    pub async fn from_cli(cli: &Cli) -> Result<Self> {
        let mut cfg = match &cli.config {
            Some(path) => Self::read(path).await?,
            None => Self::default(),
        };
        cfg.apply_overrides(cli);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(m) = cli.mechanism {
            self.mechanisms = m.mechanisms();
        }
        if let Some(a) = cli.admission {
            self.admission = a.into();
        }
        if let Some(t) = cli.timesteps {
            self.simulation.timesteps = t;
        }
        if let Some(r) = cli.runs {
            self.simulation.runs = r;
        }
        if let Some(s) = cli.seed {
            self.simulation.seed = s;
        }
        if let Some(n) = cli.mempool_length {
            self.demand.mempool_length = n;
        }
    }

    /// Market parameters of one mechanism.
    pub fn market_config(&self, mechanism: Mechanism) -> MarketConfig {
        MarketConfig {
            mechanism,
            admission: self.admission,
            demand: self.demand.clone(),
            eip1559: self.eip1559.clone(),
            legacy: self.legacy.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.mechanisms.is_empty(), "no mechanism selected");
        for &mechanism in &self.mechanisms {
            self.market_config(mechanism)
                .validate()
                .with_context(|| format!("invalid {mechanism} parameters"))?;
        }
        Ok(())
    }
}
