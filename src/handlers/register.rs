//! Self-registration gated by a one-time code.
//!
//! A signed-in administrator asks for a code and passes it on out of band;
//! the newcomer redeems it on `/register`. Codes live for ten minutes and
//! issuing a new one invalidates the previous one.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use super::shared_types::{api_error, require_session, ApiError};
use crate::app_state::AppState;
use crate::domain::{AlreadyExists, NewUser, RegistrationCode};
use crate::password;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCodeResponse {
    //
    pub message: String,
    #[serde(flatten)]
    pub code: RegistrationCode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    //
    pub username: Option<String>,
    pub password: Option<String>,
    pub verification_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    //
    pub message: String,
    pub user_id: String,
}

/// POST /api/register/code
///
/// Issues a fresh registration code. Requires a session.
pub async fn issue_registration_code(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<(StatusCode, Json<RegistrationCodeResponse>), ApiError> {
    // ---
    let session = require_session(&cookies, &state)?;

    let code = RegistrationCode::generate(Utc::now());
    state
        .repository()
        .store_registration_code(&code)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store registration code: {:?}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to issue registration code")
        })?;

    tracing::info!(
        "Registration code issued by '{}', valid until {}",
        session.username,
        code.expires_at
    );

    Ok((
        StatusCode::CREATED,
        Json(RegistrationCodeResponse {
            message: "Registration code issued".to_string(),
            code,
        }),
    ))
}

/// POST /api/register
///
/// # Request Body
/// ```json
/// { "username": "carol", "password": "...", "verificationCode": "123456" }
/// ```
///
/// # Errors
/// - 400 when a field is missing or the body is not JSON
/// - 403 when the code is unknown, expired or already used
/// - 409 when the username is taken
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    // ---
    let Json(req) = payload
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, "Invalid request format"))?;

    let (username, plaintext, code) = match (req.username, req.password, req.verification_code) {
        (Some(u), Some(p), Some(c)) if !u.trim().is_empty() && !p.is_empty() && !c.is_empty() => {
            (u.trim().to_string(), p, c)
        }
        _ => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Missing username, password, or verification code",
            ))
        }
    };

    let repo = state.repository();
    let store_error = |e: anyhow::Error| {
        tracing::error!("Registration failed: {:?}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "An internal server error occurred")
    };
    let invalid_code = || {
        tracing::info!("Registration for '{}' rejected: bad verification code", username);
        api_error(StatusCode::FORBIDDEN, "Invalid or expired verification code.")
    };

    let now = Utc::now();
    if !repo.registration_code_is_live(&code, now).await.map_err(store_error)? {
        return Err(invalid_code());
    }
    if repo.get_user_by_username(&username).await.map_err(store_error)?.is_some() {
        return Err(api_error(StatusCode::CONFLICT, "Username already exists."));
    }
    // Redeemed here so that two concurrent registrations cannot share a code
    if !repo.consume_registration_code(&code, now).await.map_err(store_error)? {
        return Err(invalid_code());
    }

    let password_hash = tokio::task::spawn_blocking(move || password::hash(&plaintext))
        .await
        .map_err(|e| store_error(e.into()))?
        .map_err(|e| store_error(anyhow::anyhow!("password hashing failed: {e}")))?;

    let user = repo
        .create_user(NewUser {
            username,
            email: None,
            password_hash,
        })
        .await
        .map_err(|e| match e.downcast_ref::<AlreadyExists>() {
            Some(taken) => api_error(StatusCode::CONFLICT, format!("{taken}.")),
            None => store_error(e),
        })?;

    tracing::info!("User '{}' registered with a verification code", user.username);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user_id: user.id.to_string(),
        }),
    ))
}
