//! # Pulse Core
//!
//! Shared building blocks for the Pulse analytics service. Every other Pulse
//! crate depends on this one.
//!
//! ## Features
//!
//! - **Event model**: the three append-only event kinds and their unstamped drafts
//! - **Payloads**: JSON ingestion payloads and their validation rules
//! - **Errors**: the `PulseError` taxonomy shared by the HTTP layer
//! - **Clock**: an injectable time source used for stamping and windowing
//! - **Observability**: one-shot tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust
//! use pulse_core::payload::ReplacementPayload;
//!
//! let body = serde_json::json!({
//!     "userId": "user_abc123def",
//!     "success": true,
//!     "method": "Win32DirectReplacer",
//!     "targetApp": "notepad.exe",
//! });
//! let draft = ReplacementPayload::from_value(body).unwrap().validate().unwrap();
//! assert_eq!(draft.text_length, 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod error;
pub mod event;
pub mod observability;
pub mod payload;

// Re-export commonly used items
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PulseError, PulseResult};
pub use event::{
    ErrorEvent, EventId, EventKind, NewError, NewReplacement, NewUserAction, ReplacementEvent,
    UserActionEvent,
};
pub use payload::{ErrorPayload, ReplacementPayload, RequestContext, UserActionPayload};

/// Version information for the Pulse Core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of the Pulse Core library
pub const NAME: &str = env!("CARGO_PKG_NAME");
