// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod providers;
pub mod view;

pub use crate::aggregate::{merge_listings, Aggregator, FetchState};
pub use crate::api::router;
pub use crate::model::{JobListing, ProviderKind, SearchQuery};

use crate::api::AppState;
use crate::config::AppConfig;

/// Build the application router from validated configuration.
/// `/metrics` is not included; the binary merges it after installing the recorder.
pub fn app(cfg: &AppConfig) -> anyhow::Result<axum::Router> {
    let state = AppState::from_config(cfg)?;
    Ok(router(state))
}
