use axum::{http::StatusCode, Json};
use serde::Serialize;
use tower_cookies::Cookies;

use crate::app_state::AppState;
use crate::session::{self, SessionInfo};

/// Error body shared by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    // ---
    pub message: String,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    // ---
    pub message: String,
}

/// Error half of every JSON handler's return type.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
}

/// Reads the session cookie and rejects the request with 401 when absent.
///
/// API routes are excluded from the route guard, so this is the actual
/// enforcement point for them.
pub fn require_session(cookies: &Cookies, state: &AppState) -> Result<SessionInfo, ApiError> {
    // ---
    session::validate_session(cookies, state.session_keys()).ok_or_else(|| {
        tracing::debug!("Rejecting API request without a valid session");
        api_error(
            StatusCode::UNAUTHORIZED,
            "Unauthorized: You must be logged in.",
        )
    })
}
