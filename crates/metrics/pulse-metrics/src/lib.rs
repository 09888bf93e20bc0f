//! # Pulse Metrics
//!
//! Read-only statistics computed from the event store on every call.
//!
//! [`AggregationEngine`] asks an [`pulse_store::EventStore`] for grouped
//! tallies and turns them into ranked report rows. Nothing is cached,
//! so a result is never older than the last append committed before the
//! call started.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod report;
mod stats;
pub mod window;

pub use engine::{AggregationEngine, MAX_MINUTE_BUCKETS};
pub use report::{
    ActionStats, AppStats, DailyUsage, ErrorSummary, MethodStats, MinuteActivity, Overview,
    UserStats,
};
