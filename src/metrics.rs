// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Only one per process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("proxy_requests_total", "Inbound proxy requests per provider.");
        describe_counter!(
            "proxy_upstream_errors_total",
            "Proxy requests that failed upstream and returned 500."
        );
        describe_histogram!("proxy_upstream_ms", "Upstream call time in milliseconds.");
        describe_counter!(
            "normalize_dropped_total",
            "Provider items dropped for lacking a title or apply URL."
        );
        describe_counter!("aggregate_cycles_total", "Settled fetch cycles by outcome.");
        describe_counter!(
            "aggregate_stale_discarded_total",
            "Fetch cycles discarded because a newer cycle had started."
        );
    });
}
