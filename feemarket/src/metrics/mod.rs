//! Metrics and instrumentation for simulated markets.
//!
//! Typical usage:
//!
//! ```ignore
//! use std::sync::Arc;
//! use feemarket::metrics::MetricsRegistry;
//!
//! let registry = Arc::new(MetricsRegistry::new()?);
//! let engine = engine.with_metrics(registry.clone());
//!
//! // After the runs:
//! println!("{}", registry.gather_text());
//! ```

pub mod prometheus;

pub use self::prometheus::{MarketMetrics, MetricsRegistry};
