//! # Pulse Server
//!
//! HTTP surface of the Pulse telemetry service: three authenticated
//! ingestion endpoints, the dashboard's metrics endpoints and an
//! unauthenticated health probe.
//!
//! The binary wires things up in this order:
//!
//! 1. [`PulseConfig::load`] reads the optional TOML file and environment
//! 2. [`open_configured_store`] opens the event store and ensures its schema
//! 3. [`install_recorder`] installs the Prometheus recorder behind `GET /metrics`
//! 4. [`ApiState::new`] builds the shared handler state
//! 5. [`PulseServer::start_with_shutdown`] serves until the shutdown future resolves

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod query;
pub mod server;

pub use config::{AuthConfig, LoggingConfig, PulseConfig, ServerConfig};
pub use error::ApiError;
pub use server::{create_router, install_recorder, open_configured_store, ApiState, PulseServer};

/// Service name reported by `GET /`
pub const SERVICE_NAME: &str = "pulse-server";

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
