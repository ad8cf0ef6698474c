//! Prometheus-backed market metrics.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and a set of strongly-typed market metrics. Every metric is
//! labelled by mechanism, so runs of both markets can share one registry;
//! gauges are additionally labelled by run index.

use prometheus::{
    self, Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};

use crate::config::Mechanism;
use crate::types::{GWEI, Gas, Wei};

/// Market-related Prometheus metrics.
#[derive(Clone)]
pub struct MarketMetrics {
    /// Blocks produced by the selector.
    pub blocks_produced: IntCounterVec,
    /// Transactions admitted into blocks.
    pub txs_included: IntCounterVec,
    /// Transactions dropped because their fee cap was below the base fee.
    pub txs_underpriced: IntCounterVec,
    /// Gas used by produced blocks.
    pub block_gas_used: HistogramVec,
    /// Current base fee, in gwei.
    pub basefee_gwei: GaugeVec,
    /// Gas used by the latest block over the utilisation target.
    pub block_utilisation: GaugeVec,
}

impl MarketMetrics {
    /// Registers market metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let blocks_produced = IntCounterVec::new(
            Opts::new("blocks_produced_total", "Blocks produced by the selector"),
            &["mechanism"],
        )?;
        registry.register(Box::new(blocks_produced.clone()))?;

        let txs_included = IntCounterVec::new(
            Opts::new("txs_included_total", "Transactions admitted into blocks"),
            &["mechanism"],
        )?;
        registry.register(Box::new(txs_included.clone()))?;

        let txs_underpriced = IntCounterVec::new(
            Opts::new(
                "txs_underpriced_total",
                "Transactions excluded because their fee cap was below the base fee",
            ),
            &["mechanism"],
        )?;
        registry.register(Box::new(txs_underpriced.clone()))?;

        let block_gas_used = HistogramVec::new(
            HistogramOpts::new("block_gas_used", "Gas used by produced blocks").buckets(vec![
                1_000_000.0,
                5_000_000.0,
                10_000_000.0,
                12_500_000.0,
                15_000_000.0,
                20_000_000.0,
                25_000_000.0,
                30_000_000.0,
            ]),
            &["mechanism"],
        )?;
        registry.register(Box::new(block_gas_used.clone()))?;

        let basefee_gwei = GaugeVec::new(
            Opts::new("basefee_gwei", "Current base fee in gwei"),
            &["mechanism", "run"],
        )?;
        registry.register(Box::new(basefee_gwei.clone()))?;

        let block_utilisation = GaugeVec::new(
            Opts::new(
                "block_utilisation_ratio",
                "Gas used by the latest block over the utilisation target",
            ),
            &["mechanism", "run"],
        )?;
        registry.register(Box::new(block_utilisation.clone()))?;

        Ok(Self {
            blocks_produced,
            txs_included,
            txs_underpriced,
            block_gas_used,
            basefee_gwei,
            block_utilisation,
        })
    }

    /// Records one produced block.
    pub fn observe_block(
        &self,
        mechanism: Mechanism,
        included: usize,
        underpriced: usize,
        gas_used: Gas,
    ) {
        let m = [mechanism.as_str()];
        self.blocks_produced.with_label_values(&m).inc();
        self.txs_included
            .with_label_values(&m)
            .inc_by(included as u64);
        self.txs_underpriced
            .with_label_values(&m)
            .inc_by(underpriced as u64);
        self.block_gas_used
            .with_label_values(&m)
            .observe(gas_used as f64);
    }

    /// Records the gauges of one run after a block.
    pub fn set_run_gauges(
        &self,
        mechanism: Mechanism,
        run: usize,
        basefee: Option<Wei>,
        utilisation: f64,
    ) {
        let run = run.to_string();
        let labels = [mechanism.as_str(), run.as_str()];
        if let Some(basefee) = basefee {
            self.basefee_gwei
                .with_label_values(&labels)
                .set(basefee as f64 / GWEI as f64);
        }
        self.block_utilisation
            .with_label_values(&labels)
            .set(utilisation);
    }
}

/// Wrapper around a Prometheus registry and the market metrics.
///
/// This is the handle passed to engines. It can be wrapped in an `Arc`
/// and shared across threads running independent simulations.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub market: MarketMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// and registers the market metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("feemarket".to_string()), None)?;
        let market = MarketMetrics::register(&registry)?;
        Ok(Self { registry, market })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!("failed to encode Prometheus metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_metrics_register_and_record() {
        let registry = Registry::new();
        let metrics = MarketMetrics::register(&registry).expect("register metrics");

        metrics.observe_block(Mechanism::Eip1559, 10, 2, 250_000);
        metrics.set_run_gauges(Mechanism::Eip1559, 0, Some(GWEI), 0.02);

        assert_eq!(
            metrics
                .txs_included
                .with_label_values(&["eip1559"])
                .get(),
            10
        );
        assert_eq!(
            metrics
                .basefee_gwei
                .with_label_values(&["eip1559", "0"])
                .get(),
            1.0
        );
        assert!(!registry.gather().is_empty());
    }

    #[test]
    fn metrics_registry_gather_text_works() {
        let registry = MetricsRegistry::new().expect("create metrics registry");
        registry
            .market
            .observe_block(Mechanism::Legacy, 1, 0, 21_000);
        let text = registry.gather_text();
        assert!(text.contains("feemarket_blocks_produced_total"));
        assert!(text.contains("mechanism=\"legacy\""));
    }
}
