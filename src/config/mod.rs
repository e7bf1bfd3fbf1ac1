// src/config/mod.rs
//! Process configuration: provider credentials, endpoints and timeouts.
//!
//! Everything is resolved once at startup. A missing credential is a
//! [`ConfigError`], never a runtime 500 from the proxies.

pub mod dashboard;

use std::fmt;
use std::time::Duration;

use crate::model::SearchQuery;

pub const ENV_LINKEDIN_ACCESS_TOKEN: &str = "LINKEDIN_ACCESS_TOKEN";
pub const ENV_LINKEDIN_API_URL: &str = "LINKEDIN_API_URL";
pub const ENV_GLASSDOOR_PARTNER_ID: &str = "GLASSDOOR_PARTNER_ID";
pub const ENV_GLASSDOOR_API_KEY: &str = "GLASSDOOR_API_KEY";
pub const ENV_GLASSDOOR_API_URL: &str = "GLASSDOOR_API_URL";
pub const ENV_PROVIDER_TIMEOUT_MS: &str = "PROVIDER_TIMEOUT_MS";
pub const ENV_AGGREGATOR_SOURCE: &str = "AGGREGATOR_SOURCE";
pub const ENV_AGGREGATOR_PROXY_BASE: &str = "AGGREGATOR_PROXY_BASE";

pub const DEFAULT_LINKEDIN_API_URL: &str = "https://api.linkedin.com/v2/jobs";
pub const DEFAULT_GLASSDOOR_API_URL: &str = "https://api.glassdoor.com/v1/jobs";
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_PROXY_BASE: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required variable absent or blank.
    #[error("missing required configuration: {0}")]
    Missing(&'static str),
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("dashboard config file: {0}")]
    File(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct LinkedInCredentials {
    pub access_token: String,
}

impl fmt::Debug for LinkedInCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedInCredentials")
            .field("access_token", &redacted(&self.access_token))
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct GlassdoorCredentials {
    pub partner_id: String,
    pub api_key: String,
}

impl fmt::Debug for GlassdoorCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlassdoorCredentials")
            .field("partner_id", &self.partner_id)
            .field("api_key", &redacted(&self.api_key))
            .finish()
    }
}

fn redacted(secret: &str) -> String {
    format!("<redacted len={}>", secret.len())
}

/// Where the aggregator gets its listings from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMode {
    /// Call the upstream providers in-process.
    Direct,
    /// Call this service's own proxy endpoints over HTTP.
    Proxy { base_url: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub linkedin: LinkedInCredentials,
    pub linkedin_url: String,
    pub glassdoor: GlassdoorCredentials,
    pub glassdoor_url: String,
    pub provider_timeout: Duration,
    pub source_mode: SourceMode,
    /// Interests and location the host page supplies.
    pub dashboard: SearchQuery,
}

impl AppConfig {
    /// Read configuration from the process environment plus the dashboard file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let dashboard = dashboard::load_dashboard_default()?;
        Self::from_lookup(|key| std::env::var(key).ok(), dashboard)
    }

    /// Build from an arbitrary key lookup; `from_env` is this over `std::env`.
    pub fn from_lookup<F>(lookup: F, dashboard: SearchQuery) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let linkedin = LinkedInCredentials {
            access_token: require(ENV_LINKEDIN_ACCESS_TOKEN)?,
        };
        let glassdoor = GlassdoorCredentials {
            partner_id: require(ENV_GLASSDOOR_PARTNER_ID)?,
            api_key: require(ENV_GLASSDOOR_API_KEY)?,
        };

        let provider_timeout = match get(ENV_PROVIDER_TIMEOUT_MS) {
            None => Duration::from_millis(DEFAULT_PROVIDER_TIMEOUT_MS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: ENV_PROVIDER_TIMEOUT_MS,
                        reason: format!("expected a positive integer, got '{raw}'"),
                    })
                }
            },
        };

        let source_mode = match get(ENV_AGGREGATOR_SOURCE)
            .unwrap_or_else(|| "direct".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "direct" => SourceMode::Direct,
            "proxy" => SourceMode::Proxy {
                base_url: get(ENV_AGGREGATOR_PROXY_BASE)
                    .unwrap_or_else(|| DEFAULT_PROXY_BASE.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
            other => {
                return Err(ConfigError::Invalid {
                    var: ENV_AGGREGATOR_SOURCE,
                    reason: format!("expected 'direct' or 'proxy', got '{other}'"),
                })
            }
        };

        Ok(Self {
            linkedin,
            linkedin_url: get(ENV_LINKEDIN_API_URL)
                .unwrap_or_else(|| DEFAULT_LINKEDIN_API_URL.to_string()),
            glassdoor,
            glassdoor_url: get(ENV_GLASSDOOR_API_URL)
                .unwrap_or_else(|| DEFAULT_GLASSDOOR_API_URL.to_string()),
            provider_timeout,
            source_mode,
            dashboard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    fn base_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_LINKEDIN_ACCESS_TOKEN, "li-token"),
            (ENV_GLASSDOOR_PARTNER_ID, "gd-partner"),
            (ENV_GLASSDOOR_API_KEY, "gd-key"),
        ]
    }

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let cfg = AppConfig::from_lookup(lookup_from(&base_pairs()), dashboard::default_query())
            .unwrap();
        assert_eq!(cfg.linkedin_url, DEFAULT_LINKEDIN_API_URL);
        assert_eq!(cfg.glassdoor_url, DEFAULT_GLASSDOOR_API_URL);
        assert_eq!(cfg.provider_timeout, Duration::from_millis(10_000));
        assert_eq!(cfg.source_mode, SourceMode::Direct);
    }

    #[test]
    fn missing_or_blank_credentials_fail_fast() {
        let err = AppConfig::from_lookup(
            lookup_from(&[(ENV_GLASSDOOR_PARTNER_ID, "p"), (ENV_GLASSDOOR_API_KEY, "k")]),
            dashboard::default_query(),
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_LINKEDIN_ACCESS_TOKEN));

        let mut pairs = base_pairs();
        pairs[2] = (ENV_GLASSDOOR_API_KEY, "   ");
        let err = AppConfig::from_lookup(lookup_from(&pairs), dashboard::default_query())
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_GLASSDOOR_API_KEY));
    }

    #[test]
    fn invalid_timeout_and_source_are_rejected() {
        let mut pairs = base_pairs();
        pairs.push((ENV_PROVIDER_TIMEOUT_MS, "0"));
        let err = AppConfig::from_lookup(lookup_from(&pairs), dashboard::default_query())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == ENV_PROVIDER_TIMEOUT_MS));

        let mut pairs = base_pairs();
        pairs.push((ENV_AGGREGATOR_SOURCE, "carrier-pigeon"));
        let err = AppConfig::from_lookup(lookup_from(&pairs), dashboard::default_query())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var, .. } if var == ENV_AGGREGATOR_SOURCE));
    }

    #[test]
    fn errors_name_the_offending_variable() {
        assert_eq!(
            ConfigError::Missing(ENV_LINKEDIN_ACCESS_TOKEN).to_string(),
            "missing required configuration: LINKEDIN_ACCESS_TOKEN"
        );
        let err = ConfigError::Invalid {
            var: ENV_PROVIDER_TIMEOUT_MS,
            reason: "must be > 0".into(),
        };
        assert_eq!(err.to_string(), "invalid PROVIDER_TIMEOUT_MS: must be > 0");
        let boxed: Box<dyn std::error::Error> = Box::new(ConfigError::File("bad toml".into()));
        assert_eq!(boxed.to_string(), "dashboard config file: bad toml");
    }

    #[test]
    fn proxy_mode_strips_trailing_slash() {
        let mut pairs = base_pairs();
        pairs.push((ENV_AGGREGATOR_SOURCE, "Proxy"));
        pairs.push((ENV_AGGREGATOR_PROXY_BASE, "http://localhost:9000/"));
        let cfg = AppConfig::from_lookup(lookup_from(&pairs), dashboard::default_query())
            .unwrap();
        assert_eq!(
            cfg.source_mode,
            SourceMode::Proxy {
                base_url: "http://localhost:9000".into()
            }
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = AppConfig::from_lookup(lookup_from(&base_pairs()), dashboard::default_query())
            .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("li-token"));
        assert!(!dbg.contains("gd-key"));
        assert!(dbg.contains("gd-partner"));
    }
}
