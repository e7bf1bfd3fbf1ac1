// src/model.rs
//! Core data types shared by the proxies, the aggregator and the view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Location scope used when the caller does not provide one.
pub const DEFAULT_LOCATION: &str = "worldwide";

/// One job posting after normalization from a provider payload.
///
/// Listings are built fresh on every fetch cycle and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    /// Provider-prefixed identifier, e.g. `linkedin:3921`.
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    /// `None` when the provider date could not be parsed; sorts least-recent.
    pub posted_at: Option<DateTime<Utc>>,
    pub apply_url: String,
}

/// Parameters driving a fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub interests: Vec<String>,
    pub location: String,
}

impl SearchQuery {
    pub fn new<I, S>(interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            interests: interests.into_iter().map(Into::into).collect(),
            location: DEFAULT_LOCATION.to_string(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Parse a comma separated interest list (`"rust, go,,"` -> `["rust", "go"]`).
    pub fn from_csv(csv: &str) -> Self {
        Self::new(
            csv.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        )
    }

    /// Interests joined with `,` the way the proxy endpoints expect them.
    pub fn keywords_csv(&self) -> String {
        self.interests.join(",")
    }

    pub fn to_proxy_query(&self) -> ProxyQuery {
        ProxyQuery {
            keywords: self.keywords_csv(),
            location: self.location.clone(),
        }
    }
}

/// Wire-level query accepted by the provider proxy endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyQuery {
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub location: String,
}

/// Identity of an upstream job provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    LinkedIn,
    Glassdoor,
}

impl ProviderKind {
    /// Human readable name, used in error payloads.
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::LinkedIn => "LinkedIn",
            ProviderKind::Glassdoor => "Glassdoor",
        }
    }

    /// Path segment under `/api/<segment>/jobs`; also prefixes listing ids.
    pub fn segment(self) -> &'static str {
        match self {
            ProviderKind::LinkedIn => "linkedin",
            ProviderKind::Glassdoor => "glassdoor",
        }
    }

    pub fn proxy_path(self) -> String {
        format!("/api/{}/jobs", self.segment())
    }

    /// Fixed message returned to callers when the upstream call fails.
    pub fn error_message(self) -> String {
        format!("Error fetching {} jobs", self.label())
    }
}
