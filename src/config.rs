// src/config.rs

//! Application configuration loaded from environment variables.
//!
//! This module defines all startup-time configuration for the service.
//! Configuration is validated eagerly and failures are treated as
//! deployment errors rather than recoverable runtime conditions.

use anyhow::Result;
use std::time::Duration;

// ============================================================
// Local macros (config-only, intentionally explicit)
// ============================================================

/// Reads a required environment variable.
///
/// # Behavior
/// - Fails fast if the variable is missing or empty
/// - Produces a clear, human-readable error message
/// - Intended for startup-time configuration validation
///
/// Missing configuration is treated as a deployment error,
/// not a recoverable runtime condition.
macro_rules! required_env {
    // ---
    ($key:literal) => {
        std::env::var($key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!(concat!("Missing required configuration: ", $key)))?
    };
}

/// Reads an optional environment variable and attempts to parse it.
///
/// If the variable is missing or cannot be parsed, the provided
/// default value is used. This macro is appropriate for non-critical
/// tuning parameters where fallback behavior is acceptable.
macro_rules! optional_env_parse {
    // ---
    ($key:literal, $ty:ty, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.parse::<$ty>().ok())
            .unwrap_or($default)
    };
}

#[cfg(test)]
/// Asserts that a configuration constructor fails due to a missing
/// required environment variable.
///
/// This macro is intended for config unit tests only and enforces
/// consistent error messages across failure cases.
macro_rules! assert_missing_config {
    // ---
    ($expr:expr, $key:literal) => {{
        let err = $expr.expect_err("expected configuration error");
        assert!(
            err.to_string()
                .contains(concat!("Missing required configuration: ", $key)),
            "unexpected error: {err}"
        );
    }};
}

// ============================================================
// Public configuration facade
// ============================================================

/// Aggregated application configuration.
///
/// This is the single source of truth for startup configuration.
/// All required configuration is validated eagerly during initialization.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub session: session::SessionConfig,
    pub database: database::DatabaseConfig,
    pub server: server::ServerConfig,
}

impl AppConfig {
    /// Loads and validates all application configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any required configuration is missing or invalid.
    /// This function is intended to be called exactly once at startup.
    pub fn from_env() -> Result<Self> {
        // ---
        Ok(Self {
            session: session::SessionConfig::from_env()?,
            database: database::DatabaseConfig::from_env()?,
            server: server::ServerConfig::from_env()?,
        })
    }
}

// ============================================================
// Session configuration
// ============================================================

mod session {
    // ---
    use super::*;

    /// Signing material and cookie policy for the session layer.
    ///
    /// The secret is security-critical: every allow/deny decision in the
    /// route guard and the API handlers depends on it, so it must be
    /// explicitly provided and the process refuses to start without it.
    #[derive(Clone)]
    pub struct SessionConfig {
        /// HMAC secret used to sign and verify session tokens.
        pub secret: String,

        /// Marks the session cookie `Secure`. True when `APP_ENV=production`.
        pub secure_cookies: bool,
    }

    impl SessionConfig {
        /// Builds a [`SessionConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if `JWT_SECRET_KEY` is missing or empty.
        pub fn from_env() -> Result<Self> {
            // ---
            let secret = required_env!("JWT_SECRET_KEY");
            let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

            Ok(Self {
                secret,
                secure_cookies: app_env.eq_ignore_ascii_case("production"),
            })
        }
    }

    impl std::fmt::Debug for SessionConfig {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SessionConfig")
                .field("secret", &"<redacted>")
                .field("secure_cookies", &self.secure_cookies)
                .finish()
        }
    }
}
pub use session::SessionConfig;

// ============================================================
// Database configuration
// ============================================================

mod database {
    // ---
    use super::*;

    /// Database-related configuration derived from environment variables.
    ///
    /// This configuration is required for the service to function and
    /// is validated eagerly during startup.
    #[derive(Debug, Clone)]
    pub struct DatabaseConfig {
        /// PostgreSQL connection string.
        pub database_url: String,

        /// Number of retry attempts when initializing the database connection. Defaults to 50.
        pub retry_count: u32,

        /// Maximum time to wait when acquiring a connection from the pool. Defaults to 30 seconds.
        pub acquire_timeout: Duration,

        /// Minimum number of connections to keep in the pool, even when idle. Defaults to 2.
        pub min_connections: u32,

        /// Maximum number of connections to be open concurrently. Defaults to 15
        pub max_connections: u32,
    }

    impl DatabaseConfig {
        /// Builds a [`DatabaseConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if required configuration is missing.
        /// Startup will fail fast rather than continuing with incomplete
        /// or invalid configuration.
        pub fn from_env() -> Result<Self> {
            // ---
            let database_url = required_env!("DATABASE_URL");
            let retry_count = optional_env_parse!("ADMIN_DB_RETRY_COUNT", u32, 50);
            let acquire_timeout_secs = optional_env_parse!("ADMIN_DB_ACQUIRE_TIMEOUT_SEC", u64, 30);
            let min_connections = optional_env_parse!("ADMIN_DB_MIN_CONNECTIONS", u32, 2);
            let max_connections = optional_env_parse!("ADMIN_DB_MAX_CONNECTIONS", u32, 15);

            Ok(Self {
                database_url,
                retry_count,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
                min_connections,
                max_connections,
            })
        }
    }
}
pub use database::DatabaseConfig;

// ============================================================
// Server configuration
// ============================================================

mod server {
    // ---
    use super::*;

    /// Listener address, metrics backend and first-run account seeding.
    #[derive(Debug, Clone)]
    pub struct ServerConfig {
        /// Socket address the HTTP listener binds to.
        pub bind_addr: String,

        /// `prom` selects the Prometheus recorder; anything else is no-op.
        pub metrics_type: String,

        /// Account created at startup when it does not exist yet.
        pub bootstrap: Option<BootstrapAccount>,
    }

    /// Credentials for the account seeded on first start.
    #[derive(Clone)]
    pub struct BootstrapAccount {
        pub username: String,
        pub password: String,
    }

    impl std::fmt::Debug for BootstrapAccount {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("BootstrapAccount")
                .field("username", &self.username)
                .field("password", &"<redacted>")
                .finish()
        }
    }

    impl ServerConfig {
        /// Builds a [`ServerConfig`] from environment variables.
        ///
        /// Bootstrap credentials are only honored when both halves are set.
        pub fn from_env() -> Result<Self> {
            // ---
            let bind_addr =
                std::env::var("ADMIN_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
            let metrics_type =
                std::env::var("ADMIN_METRICS_TYPE").unwrap_or_else(|_| "noop".to_string());

            let username = std::env::var("ADMIN_BOOTSTRAP_USERNAME").ok();
            let password = std::env::var("ADMIN_BOOTSTRAP_PASSWORD").ok();
            let bootstrap = match (username, password) {
                (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                    Some(BootstrapAccount { username, password })
                }
                _ => None,
            };

            Ok(Self {
                bind_addr,
                metrics_type,
                bootstrap,
            })
        }
    }
}
pub use server::{BootstrapAccount, ServerConfig};

// ============================================================
// Tests
// ============================================================
