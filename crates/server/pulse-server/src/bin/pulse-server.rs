//! Pulse server binary

use pulse_core::{observability::init_tracing, Clock, SystemClock};
use pulse_server::{install_recorder, open_configured_store, ApiState, PulseConfig, PulseServer};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PulseConfig::load()?;
    init_tracing(&config.logging.filter, config.logging.json)?;

    info!(
        version = pulse_server::VERSION,
        host = %config.server.host,
        port = config.server.port,
        "Starting Pulse"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = open_configured_store(&config, Arc::clone(&clock)).await?;
    let metrics = install_recorder()?;
    let state = ApiState::new(store, clock, &config.auth.api_key).with_metrics(metrics);

    PulseServer::new(config.server, state)
        .start_with_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
