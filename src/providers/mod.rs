// src/providers/mod.rs
pub mod glassdoor;
pub mod linkedin;

use std::time::Instant;

use anyhow::{Context, Result};
use metrics::histogram;
use serde_json::Value;

use crate::model::{ProviderKind, ProxyQuery};

/// An upstream job search API reachable with process credentials.
#[async_trait::async_trait]
pub trait JobProvider: Send + Sync {
    /// Forward the query and return the provider's JSON body untouched.
    async fn fetch_raw(&self, query: &ProxyQuery) -> Result<Value>;
    fn kind(&self) -> ProviderKind;
}

/// Send a prepared upstream request; non-2xx and non-JSON bodies are errors.
pub(crate) async fn send_for_json(kind: ProviderKind, req: reqwest::RequestBuilder) -> Result<Value> {
    let t0 = Instant::now();
    let result = fetch_json(kind, req).await;
    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("proxy_upstream_ms", "provider" => kind.segment()).record(ms);
    result
}

async fn fetch_json(kind: ProviderKind, req: reqwest::RequestBuilder) -> Result<Value> {
    let resp = req
        .send()
        .await
        .with_context(|| format!("{} http get()", kind.segment()))?
        .error_for_status()
        .with_context(|| format!("{} upstream status", kind.segment()))?;
    resp.json::<Value>()
        .await
        .with_context(|| format!("{} upstream body is not json", kind.segment()))
}
