use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use fleet_console::api;
use fleet_console::config::{Config, LogFormat};
use fleet_console::error::AppError;
use fleet_console::state::{spawn_session_sweeper, AppState};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Compact => subscriber.compact().init(),
    }

    let http_port = config.http_port;
    let shared_state = Arc::new(AppState::new(config)?);

    tracing::info!(
        backend = %shared_state.backend.base_url(),
        online_threshold_secs = shared_state.config.online_threshold.as_secs(),
        session_idle_ttl_secs = shared_state.config.session_idle_ttl.as_secs(),
        "fleet console configured"
    );

    spawn_session_sweeper(shared_state.clone());

    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{http_port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
