//! Login, logout and session introspection endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use url::Url;

use super::shared_types::{api_error, ApiError};
use crate::app_state::AppState;
use crate::guard::{DASHBOARD_PATH, LOGIN_PATH};
use crate::password;
use crate::session::{self, SessionInfo};

/// Fixed origin candidate redirect paths are resolved against.
const LOCAL_ORIGIN: &str = "http://localhost/";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    //
    pub username: Option<String>,
    pub password: Option<String>,
    pub redirect_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    //
    pub message: String,
    pub user: LoginUser,
    pub redirect_to: String,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    //
    pub id: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    //
    pub session: Option<SessionInfo>,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Accepts only same-site relative paths as a post-login destination.
fn local_redirect(candidate: Option<&str>) -> String {
    // ---
    candidate
        .filter(|path| is_local_path(path))
        .map_or_else(|| DASHBOARD_PATH.to_string(), str::to_string)
}

/// Browsers drop tab, CR and LF while parsing a URL, so `/\t/host` becomes
/// `//host`. Control characters are refused outright and the path must
/// resolve against a fixed origin without changing host.
fn is_local_path(path: &str) -> bool {
    // ---
    if !path.starts_with('/')
        || path.starts_with("//")
        || path.contains('\\')
        || path.chars().any(char::is_control)
    {
        return false;
    }

    let Ok(base) = Url::parse(LOCAL_ORIGIN) else {
        return false;
    };
    base.join(path)
        .is_ok_and(|resolved| resolved.origin() == base.origin())
}

fn invalid_credentials() -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "Invalid username or password")
}

// ============================================================================
// Login Handler
// ============================================================================

/// POST /api/login
///
/// Checks a username/password pair against the user store and, on success,
/// sets the `session` cookie.
///
/// # Request Body
/// ```json
/// { "username": "alice", "password": "...", "redirect_to": "/dashboard/items" }
/// ```
///
/// # Errors
/// - 400 when the body is not JSON or a field is missing
/// - 401 when the user is unknown or the password does not match
/// - 500 when the user store or token signing fails
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    // ---
    let Json(req) = payload.map_err(|e| {
        tracing::debug!("Rejected login body: {}", e);
        api_error(
            StatusCode::BAD_REQUEST,
            "Invalid request format. Please provide username and password in JSON.",
        )
    })?;

    let (username, plaintext) = match (req.username, req.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Missing username or password",
            ))
        }
    };

    let user = state
        .repository()
        .get_user_by_username(&username)
        .await
        .map_err(|e| {
            tracing::error!("Database error fetching user '{}': {:?}", username, e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        })?;

    let Some(user) = user else {
        tracing::info!("Login attempt failed: user '{}' not found", username);
        state.metrics().record_login(false);
        return Err(invalid_credentials());
    };

    // Argon2 verification runs on the blocking pool.
    let hashword = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || password::verify(&plaintext, &hashword))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed for '{}': {:?}", username, e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to verify credentials")
        })?
        .map_err(|e| {
            tracing::error!("Stored password hash for '{}' is unusable: {}", username, e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to verify credentials")
        })?;

    if !matches {
        tracing::info!("Login attempt failed: password mismatch for '{}'", username);
        state.metrics().record_login(false);
        return Err(invalid_credentials());
    }

    let user_id = user.id.to_string();
    session::create_session(&cookies, state.session_keys(), &user_id, &user.username).map_err(
        |e| {
            tracing::error!("Failed to issue session for '{}': {:?}", user.username, e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session")
        },
    )?;
    state.metrics().record_login(true);

    tracing::info!("Login successful for user: {}, ID: {}", user.username, user_id);

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user: LoginUser {
            id: user_id,
            username: user.username,
        },
        redirect_to: local_redirect(req.redirect_to.as_deref()),
    }))
}

// ============================================================================
// Logout Handler
// ============================================================================

/// POST /api/logout
///
/// Clears the session cookie and sends the browser to the login page.
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> impl IntoResponse {
    // ---
    session::clear_session(&cookies, state.session_keys());
    tracing::info!("Session cookie deleted");

    (StatusCode::FOUND, [(header::LOCATION, LOGIN_PATH)])
}

// ============================================================================
// Session Handler
// ============================================================================

/// GET /api/session
///
/// Reports the current session, or `null` for anonymous callers.
pub async fn current_session(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Json<SessionResponse> {
    // ---
    Json(SessionResponse {
        session: session::validate_session(&cookies, state.session_keys()),
    })
}
