// src/lib.rs
use anyhow::Result;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use std::time::Instant;
use tower_cookies::CookieManagerLayer;

use handlers::*;

// Public exports (visible outside this module)
pub mod domain;
pub mod guard;
pub mod password;
pub mod session;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod handlers;
mod infrastructure;

// Hoist up only the public symbol(s)
pub use app_state::AppState;
pub use session::{
    clear_session, create_session, validate_session, IssuedToken, SessionInfo, SessionKeys,
    VerifyError, SESSION_COOKIE, SESSION_TTL_SECONDS,
};

pub use config::*;

// Publicly expose the infrastructure creation functions
pub use infrastructure::{
    connect_with_retry, // ---
    create_memory_repository,
    create_noop_metrics,
    create_postgres_repository,
    create_prom_metrics,
};

/// Installs the global `tracing` subscriber, honoring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    // ---
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok(); // Ignores if already initialized
}

/// Build the production router: PostgreSQL user store, metrics selected by
/// configuration, session keys from the configured secret.
pub async fn create_router(config: &AppConfig) -> Result<Router> {
    // ---
    let metrics = if config.server.metrics_type == "prom" {
        create_prom_metrics()?
    } else {
        create_noop_metrics()?
    };

    let pool = connect_with_retry(&config.database).await?;
    let repository = create_postgres_repository(pool);

    if let Some(account) = &config.server.bootstrap {
        ensure_bootstrap_account(&repository, account).await?;
    }

    let app_state = AppState::new(metrics, repository, SessionKeys::from_config(&config.session));

    Ok(build_router(app_state))
}

/// Creates the configured bootstrap account unless it already exists.
pub async fn ensure_bootstrap_account(
    repository: &domain::RepositoryPtr,
    account: &BootstrapAccount,
) -> Result<()> {
    // ---
    if repository
        .get_user_by_username(&account.username)
        .await?
        .is_some()
    {
        tracing::debug!("Bootstrap account '{}' already present", account.username);
        return Ok(());
    }

    let password_hash = password::hash(&account.password)
        .map_err(|e| anyhow::anyhow!("failed to hash bootstrap password: {e}"))?;

    repository
        .create_user(domain::NewUser {
            username: account.username.clone(),
            email: None,
            password_hash,
        })
        .await?;

    tracing::info!("Created bootstrap account '{}'", account.username);
    Ok(())
}

/// Wire routes, the route guard and the cookie layer around a prepared state.
pub fn build_router(app_state: AppState) -> Router {
    // ---
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/login", get(login_page))
        .route("/register", get(register_page))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/{section}", get(dashboard_section))
        .nest(
            "/api",
            Router::new()
                .route("/login", post(login))
                .route("/logout", post(logout))
                .route("/session", get(current_session))
                .route("/register", post(register))
                .route("/register/code", post(issue_registration_code))
                .route("/users", get(list_users).post(create_user))
                .route("/users/{id}", delete(delete_user)),
        )
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            guard::route_guard,
        ))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            track_http_requests,
        ))
        // Outermost: the guard and handlers read and write cookies through it.
        .layer(CookieManagerLayer::new())
        .with_state(app_state)
}

/// Records latency per matched route.
async fn track_http_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    // ---
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    state
        .metrics()
        .record_http_request(start, &path, &method, response.status().as_u16());
    response
}
