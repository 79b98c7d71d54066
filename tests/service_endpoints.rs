//! Health, metrics and index endpoints stay reachable without a session.

use axum::http::{header, StatusCode};

mod common;
use common::*;

#[tokio::test]
async fn health_light_and_full_report_ok() {
    // ---
    let app = TestApp::new();

    for uri in ["/health", "/health?mode=full"] {
        let res = app.send(get(uri, None)).await;
        assert_eq!(res.status(), StatusCode::OK, "{uri}");
        assert_eq!(json_body(res).await["status"], "ok");
    }
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    // ---
    let app = TestApp::new();

    let res = app.send(get("/metrics", None)).await;

    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(res.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
    // Noop metrics render nothing
    assert!(text_body(res).await.is_empty());
}

#[tokio::test]
async fn root_is_public_for_anonymous_visitors() {
    // ---
    let app = TestApp::new();

    let res = app.send(get("/", None)).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(session_set_cookie(&res).is_none());
}
