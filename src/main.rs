//! Job Dashboard — Binary Entrypoint
//! Boots the Axum HTTP server: provider proxies, aggregator, dashboard and metrics.

use anyhow::Context;
use job_dashboard::{api, config::AppConfig, metrics::Metrics};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON when LOG_FORMAT=json.
/// `try_init` because the Shuttle runtime may already own the global subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("job_dashboard=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Fail fast on missing credentials instead of serving opaque 500s.
    let cfg = AppConfig::from_env().context("loading configuration")?;
    tracing::info!(
        source = ?cfg.source_mode,
        timeout_ms = cfg.provider_timeout.as_millis() as u64,
        interests = ?cfg.dashboard.interests,
        "configuration loaded"
    );

    let metrics = Metrics::init()?;
    let state = api::AppState::from_config(&cfg)?;
    // "On mount": start the first cycle so the dashboard has data early.
    state.aggregator.ensure(&cfg.dashboard);

    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
