//! User management API authorizes every request itself.

use admin_portal::{ensure_bootstrap_account, BootstrapAccount};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

mod common;
use common::*;

fn delete(uri: &str, cookie: Option<&str>) -> Request<Body> {
    // ---
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn every_endpoint_requires_a_session() {
    // ---
    let app = TestApp::new();
    let user = app.add_user("alice", "wonderland").await;

    let res = app.send(get("/api/users", None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .send(post_json(
            "/api/users",
            json!({ "username": "bob", "password": "builder" }),
            None,
        ))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .send(delete(&format!("/api/users/{}", user.id), None))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Nothing changed
    assert_eq!(app.repository.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn expired_session_is_unauthorized() {
    // ---
    let app = TestApp::new();
    let cookie = app.session_cookie_at("u1", "alice", chrono::Utc::now() - chrono::Duration::hours(2));

    let res = app.send(get("/api/users", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_hides_password_hashes() {
    // ---
    let app = TestApp::new();
    let alice = app.add_user("alice", "wonderland").await;
    let cookie = app.session_cookie(&alice.id.to_string(), "alice");

    let res = app.send(get("/api/users", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    let users = body.as_array().expect("array");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "alice");
    assert!(users[0].get("passwordHash").is_none());
}

#[tokio::test]
async fn create_user_validates_and_detects_duplicates() {
    // ---
    let app = TestApp::new();
    let cookie = app.session_cookie("u1", "alice");

    let res = app
        .send(post_json(
            "/api/users",
            json!({ "username": "bob", "email": "bob@example.com", "password": "builder", "isAdmin": true }),
            Some(&cookie),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = json_body(res).await;
    assert_eq!(created["username"], "bob");
    assert_eq!(created["isAdmin"], false);

    let res = app
        .send(post_json(
            "/api/users",
            json!({ "username": "bob", "password": "again" }),
            Some(&cookie),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(res).await["message"], "Username already exists.");

    let res = app
        .send(post_json(
            "/api/users",
            json!({ "username": "robert", "email": "bob@example.com", "password": "again" }),
            Some(&cookie),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(res).await["message"], "Email already exists.");

    let res = app
        .send(post_json("/api/users", json!({ "username": "carol" }), Some(&cookie)))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn created_user_can_log_in() {
    // ---
    let app = TestApp::new();
    let cookie = app.session_cookie("u1", "alice");

    let res = app
        .send(post_json(
            "/api/users",
            json!({ "username": "bob", "password": "builder" }),
            Some(&cookie),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app
        .send(post_json(
            "/api/login",
            json!({ "username": "bob", "password": "builder" }),
            None,
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn delete_user_paths() {
    // ---
    let app = TestApp::new();
    let bob = app.add_user("bob", "builder").await;
    let cookie = app.session_cookie("u1", "alice");

    let res = app.send(delete("/api/users/not-a-uuid", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let stranger = uuid::Uuid::new_v4();
    let res = app
        .send(delete(&format!("/api/users/{stranger}"), Some(&cookie)))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await["message"], "User not found");
    assert_eq!(app.repository.list_users().await.unwrap().len(), 1);

    let res = app
        .send(delete(&format!("/api/users/{}", bob.id), Some(&cookie)))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["message"], "User deleted successfully");

    let res = app
        .send(delete(&format!("/api/users/{}", bob.id), Some(&cookie)))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bootstrap_account_is_created_once() {
    // ---
    let app = TestApp::new();
    let account = BootstrapAccount {
        username: "root".to_string(),
        password: "changeme".to_string(),
    };

    ensure_bootstrap_account(&app.repository, &account).await.unwrap();
    ensure_bootstrap_account(&app.repository, &account).await.unwrap();

    let users = app.repository.list_users().await.unwrap();
    assert_eq!(users.len(), 1);

    let res = app
        .send(post_json(
            "/api/login",
            json!({ "username": "root", "password": "changeme" }),
            None,
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}
