//! # Pulse Emitter
//!
//! Client side of Pulse. An instrumented desktop application holds one
//! [`Emitter`] and calls its `track_*` methods; each call posts a single
//! event to the server in the background and never reports failure back
//! to the caller. The `send_*` variants await the request and return the
//! assigned [`EventId`](pulse_core::EventId) instead.
//!
//! ```no_run
//! use pulse_emitter::{Emitter, EmitterConfig, Replacement, UserIdentity};
//!
//! # async fn run() {
//! let identity = UserIdentity::load_or_create("/tmp/auratext/pulse_user_id");
//! let emitter = Emitter::new(EmitterConfig::from_env(), identity.user_id())
//!     .expect("http client");
//!
//! emitter.track_replacement(Replacement {
//!     success: true,
//!     method: "Win32DirectReplacer".into(),
//!     target_app: "notepad.exe".into(),
//!     text_length: Some(42),
//!     response_time_ms: Some(120),
//! });
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod emitter;
pub mod error;
pub mod identity;

pub use config::EmitterConfig;
pub use emitter::{Emitter, ErrorReport, Replacement, UserAction};
pub use error::{EmitterError, Result};
pub use identity::UserIdentity;
