//! Login, logout and session endpoints.

use admin_portal::domain::NewUser;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use time::OffsetDateTime;
use tower_cookies::cookie::SameSite;

mod common;
use common::*;

#[tokio::test]
async fn login_sets_session_cookie() {
    // ---
    let app = TestApp::new();
    let user = app.add_user("alice", "wonderland").await;

    let res = app
        .send(post_json(
            "/api/login",
            json!({ "username": "alice", "password": "wonderland" }),
            None,
        ))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_set_cookie(&res).expect("login sets cookie");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.path(), Some("/"));
    assert_ne!(cookie.secure(), Some(true));

    let expires = cookie.expires_datetime().expect("cookie has expiry");
    let delta = (expires - OffsetDateTime::now_utc()).whole_seconds();
    assert!((3590..=3600).contains(&delta), "expiry delta {delta}");

    let info = app.keys.verify(Some(cookie.value())).expect("cookie verifies");
    assert_eq!(info.user_id, user.id.to_string());
    assert_eq!(info.username, "alice");

    let body = json_body(res).await;
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["redirect_to"], "/dashboard");
}

#[tokio::test]
async fn login_cookie_is_secure_in_production() {
    // ---
    let app = TestApp::with_secure_cookies(true);
    app.add_user("alice", "wonderland").await;

    let res = app
        .send(post_json(
            "/api/login",
            json!({ "username": "alice", "password": "wonderland" }),
            None,
        ))
        .await;

    let cookie = session_set_cookie(&res).expect("login sets cookie");
    assert_eq!(cookie.secure(), Some(true));
}

#[tokio::test]
async fn login_echoes_local_redirect_only() {
    // ---
    let app = TestApp::new();
    app.add_user("alice", "wonderland").await;

    let res = app
        .send(post_json(
            "/api/login",
            json!({ "username": "alice", "password": "wonderland", "redirect_to": "/dashboard/items?x=1" }),
            None,
        ))
        .await;
    assert_eq!(json_body(res).await["redirect_to"], "/dashboard/items?x=1");

    let res = app
        .send(post_json(
            "/api/login",
            json!({ "username": "alice", "password": "wonderland", "redirect_to": "https://evil.example/" }),
            None,
        ))
        .await;
    assert_eq!(json_body(res).await["redirect_to"], "/dashboard");

    for sneaky in ["/\t/evil.example", "/\r\n/evil.example", "//evil.example"] {
        let res = app
            .send(post_json(
                "/api/login",
                json!({ "username": "alice", "password": "wonderland", "redirect_to": sneaky }),
                None,
            ))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["redirect_to"], "/dashboard", "{sneaky:?}");
    }
}

#[tokio::test]
async fn login_with_unusable_stored_hash_is_server_error() {
    // ---
    let app = TestApp::new();
    app.repository
        .create_user(NewUser {
            username: "legacy".to_string(),
            email: None,
            password_hash: "not-a-phc-string".to_string(),
        })
        .await
        .unwrap();

    let res = app
        .send(post_json(
            "/api/login",
            json!({ "username": "legacy", "password": "whatever" }),
            None,
        ))
        .await;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(session_set_cookie(&res).is_none());
    assert_eq!(json_body(res).await["message"], "Failed to verify credentials");
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    // ---
    let app = TestApp::new();
    app.add_user("alice", "wonderland").await;

    for body in [
        json!({ "username": "alice", "password": "looking-glass" }),
        json!({ "username": "bob", "password": "wonderland" }),
    ] {
        let res = app.send(post_json("/api/login", body, None)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(session_set_cookie(&res).is_none());
        assert_eq!(json_body(res).await["message"], "Invalid username or password");
    }
}

#[tokio::test]
async fn login_requires_both_fields() {
    // ---
    let app = TestApp::new();

    for body in [
        json!({ "username": "alice" }),
        json!({ "password": "wonderland" }),
        json!({ "username": "", "password": "" }),
    ] {
        let res = app.send(post_json("/api/login", body, None)).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn login_rejects_malformed_json() {
    // ---
    let app = TestApp::new();
    let req = Request::builder()
        .method("POST")
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let res = app.send(req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(res).await["message"].is_string());
}

#[tokio::test]
async fn logout_clears_cookie_and_redirects() {
    // ---
    let app = TestApp::new();
    let cookie = app.session_cookie("u1", "alice");

    let req = Request::builder()
        .method("POST")
        .uri("/api/logout")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let res = app.send(req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");

    let cleared = session_set_cookie(&res).expect("logout writes cookie");
    assert_eq!(cleared.value(), "");
    assert_eq!(cleared.http_only(), Some(true));
    assert_eq!(cleared.path(), Some("/"));
    assert_eq!(
        cleared.expires_datetime(),
        Some(OffsetDateTime::UNIX_EPOCH)
    );
}

#[tokio::test]
async fn session_endpoint_reports_identity_or_null() {
    // ---
    let app = TestApp::new();

    let res = app.send(get("/api/session", None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(json_body(res).await["session"].is_null());

    let cookie = app.session_cookie("u1", "alice");
    let res = app.send(get("/api/session", Some(&cookie))).await;
    let body = json_body(res).await;
    assert_eq!(body["session"]["userId"], "u1");
    assert_eq!(body["session"]["username"], "alice");
    assert!(body["session"]["expires"].is_string());
}

#[tokio::test]
async fn login_then_dashboard_round_trip() {
    // ---
    let app = TestApp::new();
    app.add_user("alice", "wonderland").await;

    // Anonymous: bounced to login
    let res = app.send(get("/dashboard/items", None)).await;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);

    let res = app
        .send(post_json(
            "/api/login",
            json!({ "username": "alice", "password": "wonderland" }),
            None,
        ))
        .await;
    let cookie = session_set_cookie(&res).expect("cookie");
    let header_value = format!("session={}", cookie.value());

    let res = app.send(get("/dashboard/items", Some(&header_value))).await;
    assert_eq!(res.status(), StatusCode::OK);

    // Logged in users are kept away from the login page
    let res = app.send(get("/login", Some(&header_value))).await;
    assert_eq!(location(&res), "/dashboard");
}
