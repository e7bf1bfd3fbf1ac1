// src/config/dashboard.rs
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;
use crate::model::{SearchQuery, DEFAULT_LOCATION};

pub const ENV_DASHBOARD_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const DEFAULT_DASHBOARD_CONFIG_PATH: &str = "config/dashboard.toml";

/// Interests shown when no config file overrides them.
pub const DEFAULT_INTERESTS: [&str; 3] = ["web development", "javascript", "react"];

pub fn default_query() -> SearchQuery {
    SearchQuery::new(DEFAULT_INTERESTS)
}

#[derive(Debug, Deserialize)]
struct DashboardFile {
    #[serde(default)]
    interests: Vec<String>,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlRoot {
    dashboard: DashboardFile,
}

/// Load the host page query from an explicit path. Supports TOML or JSON.
pub fn load_dashboard_from(path: &Path) -> Result<SearchQuery, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::File(format!("reading {}: {e}", path.display())))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_dashboard(&content, &ext)
}

/// Resolution order:
/// 1) $DASHBOARD_CONFIG_PATH (must exist)
/// 2) config/dashboard.toml
/// 3) built-in defaults
pub fn load_dashboard_default() -> Result<SearchQuery, ConfigError> {
    if let Ok(p) = std::env::var(ENV_DASHBOARD_CONFIG_PATH) {
        let pb = PathBuf::from(&p);
        if !pb.exists() {
            return Err(ConfigError::Invalid {
                var: ENV_DASHBOARD_CONFIG_PATH,
                reason: format!("{p} does not exist"),
            });
        }
        return load_dashboard_from(&pb);
    }
    let default_path = PathBuf::from(DEFAULT_DASHBOARD_CONFIG_PATH);
    if default_path.exists() {
        return load_dashboard_from(&default_path);
    }
    Ok(default_query())
}

fn parse_dashboard(s: &str, hint_ext: &str) -> Result<SearchQuery, ConfigError> {
    let file = if hint_ext == "json" {
        serde_json::from_str::<DashboardFile>(s).map_err(|e| ConfigError::File(e.to_string()))?
    } else {
        toml::from_str::<TomlRoot>(s)
            .map(|root| root.dashboard)
            .map_err(|e| ConfigError::File(e.to_string()))?
    };
    Ok(into_query(file))
}

fn into_query(file: DashboardFile) -> SearchQuery {
    let mut interests: Vec<String> = Vec::with_capacity(file.interests.len());
    for it in file.interests {
        let t = it.trim();
        if !t.is_empty() && !interests.iter().any(|i| i == t) {
            interests.push(t.to_string());
        }
    }
    if interests.is_empty() {
        return default_query();
    }
    let location = file
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
    SearchQuery::new(interests).with_location(location)
}
