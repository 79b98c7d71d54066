// Test helpers are intentionally partially used
#![allow(dead_code)]

use admin_portal::domain::{NewUser, RepositoryPtr, User};
use admin_portal::{
    build_router, create_memory_repository, create_noop_metrics, password, AppState, SessionKeys,
};
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use chrono::{DateTime, Utc};
use tower::ServiceExt;
use tower_cookies::Cookie;

pub const TEST_SECRET: &[u8] = b"integration-test-secret";

// ============================================================================
// Test Setup
// ============================================================================

/// Router wired to an in-memory user store and known signing keys.
pub struct TestApp {
    pub router: Router,
    pub keys: SessionKeys,
    pub repository: RepositoryPtr,
}

impl TestApp {
    // ---
    pub fn new() -> Self {
        // ---
        Self::with_secure_cookies(false)
    }

    pub fn with_secure_cookies(secure: bool) -> Self {
        // ---
        let repository = create_memory_repository();
        let metrics = create_noop_metrics().expect("noop metrics");
        let state = AppState::new(metrics, repository.clone(), SessionKeys::new(TEST_SECRET, secure));

        Self {
            router: build_router(state),
            keys: SessionKeys::new(TEST_SECRET, secure),
            repository,
        }
    }

    /// Adds a user with the given password to the store.
    pub async fn add_user(&self, username: &str, plaintext: &str) -> User {
        // ---
        self.repository
            .create_user(NewUser {
                username: username.to_string(),
                email: None,
                password_hash: password::hash(plaintext).expect("hash"),
            })
            .await
            .expect("create user")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        // ---
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// `Cookie` header value for a session issued now.
    pub fn session_cookie(&self, user_id: &str, username: &str) -> String {
        // ---
        let issued = self.keys.issue(user_id, username).expect("issue");
        format!("session={}", issued.token)
    }

    /// `Cookie` header value for a session issued at `issued_at`.
    pub fn session_cookie_at(&self, user_id: &str, username: &str, issued_at: DateTime<Utc>) -> String {
        // ---
        let issued = self.keys.issue_at(user_id, username, issued_at).expect("issue");
        format!("session={}", issued.token)
    }
}

// ============================================================================
// Request / Response helpers
// ============================================================================

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    // ---
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request builds")
}

pub fn post_json(uri: &str, body: serde_json::Value, cookie: Option<&str>) -> Request<Body> {
    // ---
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request builds")
}

pub fn location(response: &Response<Body>) -> String {
    // ---
    response
        .headers()
        .get(header::LOCATION)
        .expect("response has location")
        .to_str()
        .expect("location is ascii")
        .to_string()
}

/// The `session` cookie written by the response, if any.
pub fn session_set_cookie(response: &Response<Body>) -> Option<Cookie<'static>> {
    // ---
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse(v.to_string()).ok())
        .find(|c| c.name() == "session")
}

/// Decodes the `redirect_to` query parameter of a login redirect.
pub fn redirect_to_param(location: &str) -> Option<String> {
    // ---
    let query = location.strip_prefix("/login?")?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "redirect_to")
        .map(|(_, v)| v.into_owned())
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    // ---
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}

pub async fn text_body(response: Response<Body>) -> String {
    // ---
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    String::from_utf8(bytes.to_vec()).expect("body is utf-8")
}
