//! Server components for the Pulse service

mod exporter;
mod ingest;
mod metrics_api;
mod rest_api;

pub use exporter::install_recorder;
pub use rest_api::{create_router, ApiState};

use crate::config::{PulseConfig, ServerConfig};
use axum::Router;
use pulse_core::{Clock, PulseError, PulseResult};
use pulse_store::{open_store, EventStore, StoreConfig};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Open the configured store, falling back to memory when allowed.
pub async fn open_configured_store(
    config: &PulseConfig,
    clock: Arc<dyn Clock>,
) -> PulseResult<Arc<dyn EventStore>> {
    match open_store(&config.store, Arc::clone(&clock)).await {
        Ok(store) => Ok(store),
        Err(err) if config.fallback_to_memory => {
            error!(
                error = %err,
                "Configured event store failed to open; continuing with the in-memory store"
            );
            Ok(open_store(&StoreConfig::Memory, clock).await?)
        }
        Err(err) => Err(err.into()),
    }
}

/// The Pulse HTTP server
pub struct PulseServer {
    config: ServerConfig,
    router: Router,
}

impl PulseServer {
    /// Create a server for `state`
    pub fn new(config: ServerConfig, state: ApiState) -> Self {
        let router = create_router(state, config.enable_cors);
        Self { config, router }
    }

    /// Serve until the process is killed
    pub async fn start(self) -> PulseResult<()> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn start_with_shutdown<F>(self, shutdown: F) -> PulseResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port))
            .await
            .map_err(|e| {
                PulseError::internal(format!(
                    "Failed to bind {}:{}: {e}",
                    self.config.host, self.config.port
                ))
            })?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> PulseResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| PulseError::internal(format!("Listener has no local address: {e}")))?;
        info!(%addr, "Pulse server listening");

        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| PulseError::internal(format!("Server error: {e}")))?;

        info!("Pulse server stopped");
        Ok(())
    }
}
