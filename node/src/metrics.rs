//! # Prometheus Metrics
//!
//! Ledger counters and gauges, scraped from `/metrics` on the metrics port.
//! Everything is registered in a dedicated registry with the `cashchain`
//! prefix.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// All metric handles for the node. Handles are cheap to clone.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Blocks added to the local chain, mined or received.
    pub blocks_appended_total: IntCounter,
    /// Blocks that failed validation against our tip.
    pub blocks_rejected_total: IntCounter,
    /// Times a longer candidate chain replaced ours.
    pub chain_replacements_total: IntCounter,
    /// Candidate chains rejected as invalid.
    pub chain_replacements_rejected_total: IntCounter,
    /// Current number of blocks, genesis included.
    pub chain_length: IntGauge,
    /// Time to generate, validate, and append one block.
    pub block_mining_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("cashchain".into()), None)?;

        let blocks_appended_total = IntCounter::new(
            "blocks_appended_total",
            "Total number of blocks appended to the local chain",
        )?;
        registry.register(Box::new(blocks_appended_total.clone()))?;

        let blocks_rejected_total = IntCounter::new(
            "blocks_rejected_total",
            "Total number of blocks rejected by link validation",
        )?;
        registry.register(Box::new(blocks_rejected_total.clone()))?;

        let chain_replacements_total = IntCounter::new(
            "chain_replacements_total",
            "Total number of times the local chain was replaced by a longer one",
        )?;
        registry.register(Box::new(chain_replacements_total.clone()))?;

        let chain_replacements_rejected_total = IntCounter::new(
            "chain_replacements_rejected_total",
            "Total number of candidate chains rejected as invalid",
        )?;
        registry.register(Box::new(chain_replacements_rejected_total.clone()))?;

        let chain_length = IntGauge::new("chain_length", "Number of blocks in the local chain")?;
        registry.register(Box::new(chain_length.clone()))?;

        let block_mining_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "block_mining_seconds",
                "Time to generate, validate, and append a block in seconds",
            )
            .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01]),
        )?;
        registry.register(Box::new(block_mining_seconds.clone()))?;

        Ok(Self {
            registry,
            blocks_appended_total,
            blocks_rejected_total,
            chain_replacements_total,
            chain_replacements_rejected_total,
            chain_length,
            block_mining_seconds,
        })
    }

    /// Encodes all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics handle for axum state.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
