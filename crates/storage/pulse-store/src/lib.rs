//! # Pulse Store
//!
//! Append-only storage for the three Pulse event kinds.
//!
//! The [`EventStore`] trait is the only thing the rest of the service sees.
//! Two backends implement it:
//!
//! - [`MemoryEventStore`]: process-local tables behind a lock, for tests and
//!   throwaway deployments
//! - [`SqliteEventStore`]: a SQLite file (or `:memory:` database) driven
//!   through `tokio-rusqlite`, with bounded operation timeouts
//!
//! ## Example
//!
//! ```rust,no_run
//! use pulse_core::SystemClock;
//! use pulse_store::{open_store, EventFilter, StoreConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> pulse_store::Result<()> {
//! let store = open_store(&StoreConfig::default(), Arc::new(SystemClock)).await?;
//! let recent = store.errors(&EventFilter::newest(10)).await?;
//! println!("{} recent errors", recent.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod backends;
pub mod config;
pub mod error;
pub mod factory;
pub mod traits;

pub use backends::{memory::MemoryEventStore, sqlite::SqliteEventStore};
pub use config::{SqliteConfig, StoreConfig};
pub use error::{Result, StorageError};
pub use factory::open_store;
pub use traits::{
    ActionGroup, EventFilter, EventStore, GroupBy, GroupKey, Order, ReplacementGroup,
    ReplacementTally,
};
