//! ESKEY Relay binary.

use eskey_relay::config::load_dotenv;
use eskey_relay::{create_router, AppState, Config, RelayConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Before tracing, so RUST_LOG from .env applies.
    let dotenv = load_dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ESKEY Relay");

    match dotenv {
        Ok(Some(path)) => info!(path = %path.display(), "Loaded .env"),
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "FATAL: Could not read .env");
            std::process::exit(1);
        }
    }

    // Config errors are fatal and must surface before the listener binds.
    let config = match Config::load().and_then(RelayConfig::try_from) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "FATAL: Config error, fix env vars, .env or relay.toml");
            std::process::exit(1);
        }
    };

    info!(
        network = %config.network,
        horizon = %config.horizon_url,
        asset = %config.asset,
        default_amount = %config.default_amount,
        "Configuration loaded"
    );

    let bind_address = config.bind_address();
    let state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!(error = %e, "FATAL: Could not build Horizon client");
            std::process::exit(1);
        }
    };

    let app = create_router(state);

    info!(address = %bind_address, "Listening");

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Relay shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
