use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Represents an administrator account.
///
/// `password_hash` is an Argon2 PHC string and is never serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    // ---
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Stored for records imported from older data; never consulted for authorization.
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    // ---
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
}

impl User {
    // ---
    pub fn new(new_user: NewUser) -> Self {
        // ---
        Self {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_admin: false,
            created_at: Utc::now(),
        }
    }
}
