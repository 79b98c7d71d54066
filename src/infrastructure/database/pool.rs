//! PostgreSQL pool construction.
//!
//! The database may still be starting when the service boots (compose,
//! orchestrators), so the initial connection is retried with a fixed delay
//! up to `retry_count` times before startup is abandoned.

use crate::config::DatabaseConfig;
use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

const RETRY_DELAY: Duration = Duration::from_secs(1);

const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id            UUID PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT UNIQUE,
    password_hash TEXT NOT NULL,
    is_admin      BOOLEAN NOT NULL DEFAULT FALSE,
    created_at    TIMESTAMPTZ NOT NULL
)";

const CREATE_REGISTRATION_CODES_TABLE: &str = "CREATE TABLE IF NOT EXISTS registration_codes (
    code       TEXT PRIMARY KEY,
    expires_at TIMESTAMPTZ NOT NULL
)";

/// Connects to PostgreSQL, retrying while the server is unreachable, and
/// makes sure the `users` and `registration_codes` tables exist.
///
/// # Errors
/// Returns the last connection error once all attempts are exhausted.
pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<PgPool> {
    // ---
    let options = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout);

    let attempts = config.retry_count.max(1);
    let mut attempt = 0;

    let pool = loop {
        attempt += 1;
        match options.clone().connect(&config.database_url).await {
            Ok(pool) => break pool,
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    "Database connection attempt {}/{} failed: {}",
                    attempt,
                    attempts,
                    e
                );
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to connect to database after {attempts} attempts")
                })
            }
        }
    };

    sqlx::query(CREATE_USERS_TABLE)
        .execute(&pool)
        .await
        .context("Failed to create users table")?;
    sqlx::query(CREATE_REGISTRATION_CODES_TABLE)
        .execute(&pool)
        .await
        .context("Failed to create registration_codes table")?;

    tracing::info!("Database ready after {} attempt(s)", attempt);
    Ok(pool)
}
