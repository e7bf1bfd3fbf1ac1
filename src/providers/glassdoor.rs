// src/providers/glassdoor.rs
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{send_for_json, JobProvider};
use crate::config::GlassdoorCredentials;
use crate::model::{ProviderKind, ProxyQuery};

/// Glassdoor jobs API. Credentials travel as `partnerId` / `key` query params.
pub struct GlassdoorProvider {
    client: Client,
    endpoint: String,
    credentials: GlassdoorCredentials,
    timeout: Duration,
}

impl GlassdoorProvider {
    pub fn new(client: Client, endpoint: impl Into<String>, credentials: GlassdoorCredentials) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            credentials,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl JobProvider for GlassdoorProvider {
    async fn fetch_raw(&self, query: &ProxyQuery) -> Result<Value> {
        let req = self
            .client
            .get(&self.endpoint)
            .timeout(self.timeout)
            .query(&[
                ("partnerId", self.credentials.partner_id.as_str()),
                ("key", self.credentials.api_key.as_str()),
                ("q", query.keywords.as_str()),
                ("l", query.location.as_str()),
            ]);
        send_for_json(ProviderKind::Glassdoor, req).await
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Glassdoor
    }
}
