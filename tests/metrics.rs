// tests/metrics.rs
//
// Installs the global Prometheus recorder, so it lives in its own test binary.

mod common;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use tower::ServiceExt as _;

use common::*;
use job_dashboard::metrics::Metrics;

#[tokio::test]
async fn metrics_route_exposes_proxy_series() {
    let metrics = Metrics::init().expect("install recorder");
    let up = spawn_upstream(StatusCode::OK, "[]").await;
    let app = job_dashboard::app(&test_config(&up.url, UNREACHABLE_URL))
        .expect("build app")
        .merge(metrics.router());

    for uri in ["/api/linkedin/jobs?keywords=a", "/api/glassdoor/jobs?keywords=a"] {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.clone().oneshot(req).await.unwrap();
    }

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let out = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(out.contains("proxy_requests_total"), "{out}");
    assert!(out.contains(r#"provider="linkedin""#), "{out}");
    assert!(out.contains("proxy_upstream_errors_total"), "{out}");

    assert!(Metrics::init().is_err(), "second recorder must be rejected");
}
