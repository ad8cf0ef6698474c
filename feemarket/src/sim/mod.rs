//! Orchestration of substeps into timesteps and runs.

pub mod engine;
pub mod model;
pub mod summary;

pub use engine::SimulationEngine;
pub use model::{Model, PolicyFn, Substep, UpdateFn};
pub use summary::{RunSummary, StepRecord, step_records};
