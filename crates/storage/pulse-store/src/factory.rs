//! Factory for opening a configured store

use crate::{
    backends::{memory::MemoryEventStore, sqlite::SqliteEventStore},
    config::StoreConfig,
    error::Result,
    traits::EventStore,
};
use pulse_core::Clock;
use std::sync::Arc;
use tracing::info;

/// Open the backend described by `config` and make sure its schema exists.
///
/// This is the single place the service constructs a store; the returned
/// handle is shared by the ingestion and aggregation layers.
pub async fn open_store(config: &StoreConfig, clock: Arc<dyn Clock>) -> Result<Arc<dyn EventStore>> {
    let store: Arc<dyn EventStore> = match config {
        StoreConfig::Memory => Arc::new(MemoryEventStore::new(clock)),
        StoreConfig::Sqlite(sqlite) => Arc::new(SqliteEventStore::open(sqlite, clock).await?),
    };

    store.ensure_schema().await?;
    info!(backend = store.backend_name(), "Event store opened");
    Ok(store)
}
