//! Tracing subscriber setup.

use crate::error::{PulseError, PulseResult};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_filter` when it is set. Calling this twice
/// returns an error instead of panicking.
pub fn init_tracing(default_filter: &str, json: bool) -> PulseResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| PulseError::config(format!("Invalid log filter '{default_filter}': {e}")))?;

    let builder = fmt().with_env_filter(filter).with_target(true);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| PulseError::config(format!("Failed to install tracing subscriber: {e}")))
}
