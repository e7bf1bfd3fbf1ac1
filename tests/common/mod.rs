// tests/common/mod.rs
//
// Shared helpers: a fake upstream job API served by a real Axum listener on
// an ephemeral port, and a config pointing both providers at fakes.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::Query,
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Router,
};
use job_dashboard::config::{dashboard, AppConfig};
use job_dashboard::model::SearchQuery;
use tokio::net::TcpListener;

pub const BODY_LIMIT: usize = 1024 * 1024;

/// One request as the fake upstream saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
}

pub struct FakeUpstream {
    pub url: String,
    pub seen: Arc<Mutex<Vec<Seen>>>,
}

impl FakeUpstream {
    pub fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

/// Serve `body` with `status` on `/jobs`, recording every request.
pub async fn spawn_upstream(status: StatusCode, body: &'static str) -> FakeUpstream {
    spawn_upstream_delayed(status, body, Duration::ZERO).await
}

pub async fn spawn_upstream_delayed(
    status: StatusCode,
    body: &'static str,
    delay: Duration,
) -> FakeUpstream {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let app = Router::new().route(
        "/jobs",
        get(
            move |headers: HeaderMap, Query(query): Query<HashMap<String, String>>| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(Seen {
                        query,
                        authorization: headers
                            .get(header::AUTHORIZATION)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string),
                    });
                    tokio::time::sleep(delay).await;
                    (status, [(header::CONTENT_TYPE, "application/json")], body)
                }
            },
        ),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeUpstream {
        url: format!("http://{addr}/jobs"),
        seen,
    }
}

/// Nothing listens here; connections are refused.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1/jobs";

pub fn test_config(linkedin_url: &str, glassdoor_url: &str) -> AppConfig {
    test_config_with(linkedin_url, glassdoor_url, dashboard::default_query())
}

pub fn test_config_with(linkedin_url: &str, glassdoor_url: &str, query: SearchQuery) -> AppConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        ("LINKEDIN_ACCESS_TOKEN", "li-secret".to_string()),
        ("LINKEDIN_API_URL", linkedin_url.to_string()),
        ("GLASSDOOR_PARTNER_ID", "gd-partner".to_string()),
        ("GLASSDOOR_API_KEY", "gd-secret".to_string()),
        ("GLASSDOOR_API_URL", glassdoor_url.to_string()),
        ("PROVIDER_TIMEOUT_MS", "2000".to_string()),
    ]);
    AppConfig::from_lookup(|k| vars.get(k).cloned(), query).expect("test config")
}

pub const LINKEDIN_BODY: &str = r#"[
  {"id": "x", "title": "Backend Engineer", "company": "Acme", "location": "Remote",
   "description": "Rust services", "posted": "2024-05-01T00:00:00Z",
   "url": "https://www.linkedin.com/jobs/view/x"},
  {"id": "y", "title": "Frontend Engineer", "company": "Acme", "location": "Berlin",
   "description": "React UI", "posted": "2024-05-03T00:00:00Z",
   "url": "https://www.linkedin.com/jobs/view/y"}
]"#;

pub const GLASSDOOR_BODY: &str = r#"{"response": {"jobListings": [
  {"jobListingId": 7, "jobTitle": "Fullstack Developer", "employer": {"name": "Globex"},
   "location": "Austin, TX", "descriptionFragment": "JS &amp; Rust",
   "postedDate": "2024-05-02", "jobViewUrl": "https://www.glassdoor.com/job/7"}
]}}"#;
