//! Service configuration
//!
//! Defaults, then an optional TOML file named by `PULSE_CONFIG`, then
//! environment overrides. The resulting config is validated once before the
//! server starts.

use pulse_core::{PulseError, PulseResult};
use pulse_store::{SqliteConfig, StoreConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Replace a store that fails to open with the in-memory store
    pub fallback_to_memory: bool,
    /// Listener settings
    pub server: ServerConfig,
    /// Shared secret
    pub auth: AuthConfig,
    /// Event store backend
    pub store: StoreConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Answer CORS preflights and add CORS headers
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            enable_cors: true,
        }
    }
}

/// Shared-secret settings
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token every protected request must present
    pub api_key: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl PulseConfig {
    /// Load from `PULSE_CONFIG` (if set) and the process environment, then validate
    pub fn load() -> PulseResult<Self> {
        let lookup = |key: &str| std::env::var(key).ok();

        let mut config = match lookup("PULSE_CONFIG") {
            Some(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> PulseResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PulseError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse TOML text
    pub fn from_toml_str(contents: &str) -> PulseResult<Self> {
        toml::from_str(contents)
            .map_err(|e| PulseError::config(format!("Invalid configuration: {e}")))
    }

    /// Apply `PULSE_*` overrides read through `lookup`. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> PulseResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(host) = var("PULSE_HOST") {
            self.server.host = host;
        }

        if let Some(port) = var("PULSE_PORT").or_else(|| var("PORT")) {
            self.server.port = port
                .parse()
                .map_err(|e| PulseError::config(format!("Invalid port '{port}': {e}")))?;
        }

        if let Some(api_key) = var("PULSE_API_KEY") {
            self.auth.api_key = api_key;
        }

        if let Some(path) = var("PULSE_DATABASE_PATH") {
            let path = PathBuf::from(path);
            if let StoreConfig::Sqlite(sqlite) = &mut self.store {
                sqlite.path = path;
            } else {
                self.store = StoreConfig::sqlite(path);
            }
        }

        if let Some(kind) = var("PULSE_STORE") {
            match kind.to_ascii_lowercase().as_str() {
                "memory" => self.store = StoreConfig::Memory,
                "sqlite" => {
                    if self.store == StoreConfig::Memory {
                        self.store = StoreConfig::Sqlite(SqliteConfig::default());
                    }
                }
                other => {
                    return Err(PulseError::config(format!(
                        "Unknown store '{other}', expected 'memory' or 'sqlite'"
                    )))
                }
            }
        }

        if let Some(flag) = var("PULSE_FALLBACK_TO_MEMORY") {
            self.fallback_to_memory = parse_flag("PULSE_FALLBACK_TO_MEMORY", &flag)?;
        }

        if let Some(filter) = var("PULSE_LOG") {
            self.logging.filter = filter;
        }

        if let Some(flag) = var("PULSE_LOG_JSON") {
            self.logging.json = parse_flag("PULSE_LOG_JSON", &flag)?;
        }

        Ok(())
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> PulseResult<()> {
        if self.auth.api_key.trim().is_empty() {
            return Err(PulseError::config(
                "auth.api_key is empty; set it in the config file or PULSE_API_KEY",
            ));
        }
        if self.server.host.trim().is_empty() {
            return Err(PulseError::config("server.host is empty"));
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> PulseResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(PulseError::config(format!(
            "Invalid value '{other}' for {key}, expected true or false"
        ))),
    }
}
