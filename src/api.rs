// src/api.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics::counter;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::aggregate::{Aggregator, DirectSource, ListingSource, ProxySource, Snapshot};
use crate::config::{AppConfig, SourceMode};
use crate::model::{ProxyQuery, SearchQuery};
use crate::providers::{glassdoor::GlassdoorProvider, linkedin::LinkedInProvider, JobProvider};
use crate::view;

pub const STATIC_DIR: &str = "static";

#[derive(Clone)]
pub struct AppState {
    pub linkedin: Arc<dyn JobProvider>,
    pub glassdoor: Arc<dyn JobProvider>,
    pub aggregator: Arc<Aggregator>,
    /// Interests the host page supplies when the request names none.
    pub dashboard: SearchQuery,
}

impl AppState {
    /// Wire providers and the aggregator from validated configuration.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("job-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let linkedin: Arc<dyn JobProvider> = Arc::new(
            LinkedInProvider::new(client.clone(), &cfg.linkedin_url, cfg.linkedin.clone())
                .with_timeout(cfg.provider_timeout),
        );
        let glassdoor: Arc<dyn JobProvider> = Arc::new(
            GlassdoorProvider::new(client.clone(), &cfg.glassdoor_url, cfg.glassdoor.clone())
                .with_timeout(cfg.provider_timeout),
        );

        let (primary, secondary): (Arc<dyn ListingSource>, Arc<dyn ListingSource>) =
            match &cfg.source_mode {
                SourceMode::Direct => (
                    Arc::new(DirectSource::new(linkedin.clone())) as Arc<dyn ListingSource>,
                    Arc::new(DirectSource::new(glassdoor.clone())) as Arc<dyn ListingSource>,
                ),
                SourceMode::Proxy { base_url } => (
                    Arc::new(ProxySource::new(client.clone(), base_url, linkedin.kind()))
                        as Arc<dyn ListingSource>,
                    Arc::new(ProxySource::new(client, base_url, glassdoor.kind()))
                        as Arc<dyn ListingSource>,
                ),
            };

        // Source calls get a little headroom over the upstream request timeout.
        let aggregator = Aggregator::new(primary, secondary)
            .with_timeout(cfg.provider_timeout + std::time::Duration::from_secs(1));

        Ok(Self {
            linkedin,
            glassdoor,
            aggregator: Arc::new(aggregator),
            dashboard: cfg.dashboard.clone(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/linkedin/jobs", get(linkedin_jobs))
        .route("/api/glassdoor/jobs", get(glassdoor_jobs))
        .route("/api/jobs", get(jobs_snapshot))
        .route("/", get(dashboard))
        .route("/dashboard", get(dashboard))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn linkedin_jobs(State(state): State<AppState>, Query(q): Query<ProxyQuery>) -> Response {
    proxy(state.linkedin.as_ref(), &q).await
}

async fn glassdoor_jobs(State(state): State<AppState>, Query(q): Query<ProxyQuery>) -> Response {
    proxy(state.glassdoor.as_ref(), &q).await
}

/// Pass the upstream body through verbatim, or a fixed 500 payload.
async fn proxy(provider: &dyn JobProvider, q: &ProxyQuery) -> Response {
    let kind = provider.kind();
    counter!("proxy_requests_total", "provider" => kind.segment()).increment(1);
    match provider.fetch_raw(q).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            tracing::warn!(error = ?e, provider = kind.label(), "upstream fetch failed");
            counter!("proxy_upstream_errors_total", "provider" => kind.segment()).increment(1);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": kind.error_message() })),
            )
                .into_response()
        }
    }
}

async fn jobs_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.aggregator.snapshot())
}

#[derive(Debug, Deserialize)]
struct DashboardParams {
    interests: Option<String>,
    /// Generation the page was polling; set only by the page's own refresh.
    poll: Option<u64>,
}

/// Host page: a fresh load starts a background cycle unless one for the same
/// interests is loading or ready, and the page polls until it settles.
async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Html<String> {
    let query = params
        .interests
        .as_deref()
        .map(|csv| SearchQuery::from_csv(csv).with_location(state.dashboard.location.clone()))
        .unwrap_or_else(|| state.dashboard.clone());

    let started = match params.poll {
        Some(_) => state.aggregator.ensure_polled(&query),
        None => state.aggregator.ensure(&query),
    };
    if started {
        tracing::info!(interests = ?query.interests, "dashboard triggered fetch cycle");
    }
    let snap = state.aggregator.snapshot();
    let href = poll_href(params.interests.as_deref(), snap.generation);
    Html(view::render_dashboard(&query, &snap.state, &href))
}

/// `/dashboard?interests=..&poll=<generation>`, keeping the caller's interests.
fn poll_href(interests: Option<&str>, generation: u64) -> String {
    let Ok(mut url) = Url::parse("http://localhost/dashboard") else {
        return "/dashboard".to_string();
    };
    {
        let mut pairs = url.query_pairs_mut();
        if let Some(csv) = interests {
            pairs.append_pair("interests", csv);
        }
        pairs.append_pair("poll", &generation.to_string());
    }
    match url.query() {
        Some(q) => format!("{}?{q}", url.path()),
        None => url.path().to_string(),
    }
}
