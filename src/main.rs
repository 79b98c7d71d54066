use admin_portal::{create_router, init_tracing, AppConfig};
use anyhow::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the process environment may already be complete.
    dotenvy::dotenv().ok();
    init_tracing();

    // Fails fast when JWT_SECRET_KEY or DATABASE_URL is absent.
    let config = AppConfig::from_env()?;
    info!("Starting admin portal v{}...", env!("CARGO_PKG_VERSION"));

    let app = create_router(&config).await?;

    info!("Starting at endpoint:{}", config.server.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
