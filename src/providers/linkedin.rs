// src/providers/linkedin.rs
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{send_for_json, JobProvider};
use crate::config::LinkedInCredentials;
use crate::model::{ProviderKind, ProxyQuery};

/// LinkedIn jobs API, authenticated with a bearer access token.
pub struct LinkedInProvider {
    client: Client,
    endpoint: String,
    credentials: LinkedInCredentials,
    timeout: Duration,
}

impl LinkedInProvider {
    pub fn new(client: Client, endpoint: impl Into<String>, credentials: LinkedInCredentials) -> Self {
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
impl JobProvider for LinkedInProvider {
    async fn fetch_raw(&self, query: &ProxyQuery) -> Result<Value> {
        let req = self
            .client
            .get(&self.endpoint)
            .timeout(self.timeout)
            .bearer_auth(&self.credentials.access_token)
            .query(&[
                ("keywords", query.keywords.as_str()),
                ("location", query.location.as_str()),
            ]);
        send_for_json(ProviderKind::LinkedIn, req).await
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::LinkedIn
    }
}
