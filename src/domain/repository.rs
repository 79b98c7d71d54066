use super::registration::RegistrationCode;
use super::user::{NewUser, User};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Abstraction for user account persistence.
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    // ---
    /// Create a new user. Fails if the username or email is already taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    /// Get user by username.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get user by ID.
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    /// List all users, newest first.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Delete a user. Returns `false` if no such user existed.
    async fn delete_user(&self, user_id: Uuid) -> Result<bool>;

    /// Store a registration code, discarding any previously issued one.
    async fn store_registration_code(&self, code: &RegistrationCode) -> Result<()>;

    /// Whether `code` was issued and has not expired at `now`.
    async fn registration_code_is_live(&self, code: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Remove `code` if it is still live. Returns `false` when it was
    /// unknown, expired, or already consumed.
    async fn consume_registration_code(&self, code: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Cheap round-trip used by the full health check.
    async fn ping(&self) -> Result<()>;
}

/// Type alias for any backend that implements Repository.
pub type RepositoryPtr = Arc<dyn Repository>;

/// Returned by [`Repository::create_user`] when a unique field is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlreadyExists {
    /// Which field collided: `username` or `email`.
    pub field: &'static str,
}

impl std::fmt::Display for AlreadyExists {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.field {
            "email" => "Email",
            _ => "Username",
        };
        write!(f, "{label} already exists")
    }
}

impl std::error::Error for AlreadyExists {}
