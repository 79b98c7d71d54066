//! User management API.
//!
//! Every handler authorizes on its own via [`require_session`]; `/api` is
//! outside the route guard. Any authenticated user may manage accounts.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use super::shared_types::{api_error, require_session, ApiError, MessageResponse};
use crate::app_state::AppState;
use crate::domain::{AlreadyExists, NewUser, User};
use crate::password;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    //
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// GET /api/users
///
/// Lists all accounts, newest first. Password hashes are never serialized.
pub async fn list_users(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Json<Vec<User>>, ApiError> {
    // ---
    require_session(&cookies, &state)?;

    let users = state.repository().list_users().await.map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch users")
    })?;

    Ok(Json(users))
}

/// POST /api/users
///
/// # Errors
/// - 401 without a session
/// - 400 when username or password is missing
/// - 409 when the username or email is taken
pub async fn create_user(
    State(state): State<AppState>,
    cookies: Cookies,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    // ---
    let session = require_session(&cookies, &state)?;

    let Json(req) = payload
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, "Invalid request format"))?;

    let (username, plaintext) = match (req.username, req.password) {
        (Some(u), Some(p)) if !u.trim().is_empty() && !p.is_empty() => (u.trim().to_string(), p),
        _ => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Username and password are required",
            ))
        }
    };
    let email = req.email.filter(|e| !e.trim().is_empty());

    let repo = state.repository();
    let db_error = |e: anyhow::Error| {
        tracing::error!("User store error: {:?}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
    };

    if repo.get_user_by_username(&username).await.map_err(db_error)?.is_some() {
        return Err(api_error(StatusCode::CONFLICT, "Username already exists."));
    }
    if let Some(email) = email.as_deref() {
        if repo.get_user_by_email(email).await.map_err(db_error)?.is_some() {
            return Err(api_error(StatusCode::CONFLICT, "Email already exists."));
        }
    }

    let password_hash = tokio::task::spawn_blocking(move || password::hash(&plaintext))
        .await
        .map_err(|e| db_error(e.into()))?
        .map_err(|e| db_error(anyhow::anyhow!("password hashing failed: {e}")))?;

    let user = repo
        .create_user(NewUser {
            username,
            email,
            password_hash,
        })
        .await
        .map_err(|e| match e.downcast_ref::<AlreadyExists>() {
            Some(taken) => api_error(StatusCode::CONFLICT, format!("{taken}.")),
            None => db_error(e),
        })?;

    tracing::info!("User '{}' created by '{}'", user.username, session.username);

    Ok((StatusCode::CREATED, Json(user)))
}

/// DELETE /api/users/{id}
///
/// # Errors
/// - 401 without a session
/// - 400 when `id` is not a UUID
/// - 404 when no such user exists
pub async fn delete_user(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    // ---
    let session = require_session(&cookies, &state)?;

    let user_id = Uuid::parse_str(&user_id)
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, "Invalid user ID format"))?;

    let repo = state.repository();
    let store_error = |e: anyhow::Error| {
        tracing::error!("Failed to delete user {}: {:?}", user_id, e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete user")
    };

    let Some(user) = repo.get_user_by_id(user_id).await.map_err(store_error)? else {
        return Err(api_error(StatusCode::NOT_FOUND, "User not found"));
    };

    // Lost a race with another delete
    if !repo.delete_user(user.id).await.map_err(store_error)? {
        return Err(api_error(StatusCode::NOT_FOUND, "User not found"));
    }

    tracing::info!(
        "User '{}' ({}) deleted by '{}'",
        user.username,
        user.id,
        session.username
    );

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
