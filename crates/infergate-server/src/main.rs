//! infergate server.
//!
//! - Model artifact is loaded before the listener binds; failure exits 1.
//! - Config from `INFERGATE_CONFIG` (default `infergate.yaml`), with
//!   `INFERGATE_LISTEN` / `INFERGATE_MODEL_PATH` overrides.
//! - Graceful shutdown on Ctrl+C / SIGTERM.

use std::env;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use infergate_core::error::{InferError, Result};
use infergate_server::{app_state::AppState, config, router};

const DEFAULT_CONFIG_PATH: &str = "infergate.yaml";

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, code = e.client_code().as_str(), "infergate failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = env::var("INFERGATE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut cfg = config::load_from_file(&path)?;
    cfg.apply_overrides(
        env::var("INFERGATE_LISTEN").ok(),
        env::var("INFERGATE_MODEL_PATH").ok(),
    );
    cfg.validate()?;
    let listen = cfg.server.listen_addr()?;

    let state = AppState::new(cfg)?;
    let info = state.model().describe();
    tracing::info!(
        path = %state.cfg().model.path,
        kind = info.kind,
        n_estimators = info.n_estimators,
        "model loaded"
    );
    tracing::info!(policy = ?state.metrics().policy(), "request counter policy");

    let app = router::build_router(state);

    tracing::info!(%listen, "infergate starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| InferError::Startup(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| InferError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
