//! Route guard middleware.
//!
//! Classifies each request path as protected, public-only or public and
//! redirects based on whether the request carries a valid session cookie.
//! The guard only shapes navigation; API handlers still authorize every
//! request themselves and answer 401 instead of redirecting.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

use crate::app_state::AppState;
use crate::session::{self, SESSION_COOKIE};

/// Paths requiring a valid session.
const PROTECTED_PREFIXES: &[&str] = &["/dashboard"];

/// Paths that make no sense once logged in.
const PUBLIC_ONLY_PREFIXES: &[&str] = &["/login", "/register"];

/// Paths the guard never looks at.
const EXCLUDED_PREFIXES: &[&str] = &["/api", "/static", "/assets", "/favicon.ico"];

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Static access class of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Protected,
    PublicOnly,
    Public,
}

/// What the guard does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    RedirectToLogin { clear_cookie: bool },
    RedirectToDashboard,
}

/// Segment-aware prefix match: `/dashboard` matches `/dashboard/items`
/// but not `/dashboards`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Classifies a request path. Depends on nothing but the path.
pub fn classify(path: &str) -> RouteClass {
    // ---
    if PROTECTED_PREFIXES.iter().any(|p| matches_prefix(path, p)) {
        RouteClass::Protected
    } else if PUBLIC_ONLY_PREFIXES.iter().any(|p| matches_prefix(path, p)) {
        RouteClass::PublicOnly
    } else {
        RouteClass::Public
    }
}

/// Whether the guard skips this path entirely.
pub fn is_excluded(path: &str) -> bool {
    EXCLUDED_PREFIXES.iter().any(|p| matches_prefix(path, p))
}

/// Decision table for one request.
///
/// `cookie_present` only matters for an invalid session on a protected
/// route, where the dead cookie is cleared on the redirect.
pub fn decide(class: RouteClass, session_valid: bool, cookie_present: bool) -> GuardDecision {
    // ---
    match (class, session_valid) {
        (RouteClass::Protected, false) => GuardDecision::RedirectToLogin {
            clear_cookie: cookie_present,
        },
        (RouteClass::PublicOnly, true) => GuardDecision::RedirectToDashboard,
        _ => GuardDecision::Pass,
    }
}

/// Builds `/login?redirect_to=<encoded>` for the originally requested target.
pub fn login_redirect_target(original: &str) -> String {
    // ---
    let encoded: String = url::form_urlencoded::byte_serialize(original.as_bytes()).collect();
    format!("{LOGIN_PATH}?redirect_to={encoded}")
}

/// Axum middleware applying [`decide`] to every non-excluded request.
pub async fn route_guard(
    State(state): State<AppState>,
    cookies: Cookies,
    request: Request,
    next: Next,
) -> Response {
    // ---
    let path = request.uri().path().to_string();
    if is_excluded(&path) {
        return next.run(request).await;
    }

    let class = classify(&path);
    if class == RouteClass::Public {
        return next.run(request).await;
    }

    let cookie_present = cookies
        .get(SESSION_COOKIE)
        .is_some_and(|c| !c.value().is_empty());
    let session = session::validate_session(&cookies, state.session_keys());

    match decide(class, session.is_some(), cookie_present) {
        GuardDecision::Pass => next.run(request).await,
        GuardDecision::RedirectToLogin { clear_cookie } => {
            let original = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or(path);

            tracing::info!("Unauthenticated access to {}. Redirecting to login.", original);
            if clear_cookie {
                session::clear_session(&cookies, state.session_keys());
            }
            state.metrics().record_guard_redirect("login");

            Redirect::temporary(&login_redirect_target(&original)).into_response()
        }
        GuardDecision::RedirectToDashboard => {
            tracing::info!("Authenticated user accessing {}. Redirecting to dashboard.", path);
            state.metrics().record_guard_redirect("dashboard");

            Redirect::temporary(DASHBOARD_PATH).into_response()
        }
    }
}
