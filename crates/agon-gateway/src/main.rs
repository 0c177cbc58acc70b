//! Agon gateway
//!
//! - `POST /chat` forwards a conversation to the configured LLM provider
//! - `/`, `/health`, `/metrics` for operations
//! - Every request is timed and counted by the instrumentation layer

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use agon_core::error::{AgonError, Result};
use agon_gateway::{app_state, config, router};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "agon-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cfg = config::load()?;
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| AgonError::BadRequest(format!("server.listen: {e}")))?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, "agon-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| AgonError::Internal(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AgonError::Internal(format!("server failed: {e}")))?;

    tracing::info!("agon-gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl_c handler failed; shutting down");
    }
    tracing::info!("shutdown signal received");
}
