//! Configuration structures for store backends

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Which backend to open, and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process-local tables, lost on exit
    Memory,

    /// SQLite database file
    Sqlite(SqliteConfig),
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Sqlite(SqliteConfig::default())
    }
}

impl StoreConfig {
    /// SQLite at `path` with default tuning
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self::Sqlite(SqliteConfig {
            path: path.into(),
            ..SqliteConfig::default()
        })
    }
}

/// Configuration for SQLite storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Path to the database file, or `:memory:`
    #[serde(default = "default_sqlite_path")]
    pub path: PathBuf,

    /// How long SQLite waits on a locked database
    #[serde(default = "default_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Upper bound on any single store operation
    #[serde(default = "default_timeout_ms")]
    pub operation_timeout_ms: u64,

    /// Use write-ahead logging
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: default_sqlite_path(),
            busy_timeout_ms: default_timeout_ms(),
            operation_timeout_ms: default_timeout_ms(),
            wal_mode: default_wal_mode(),
        }
    }
}

impl SqliteConfig {
    /// `busy_timeout_ms` as a duration
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// `operation_timeout_ms` as a duration
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Whether this points at a transient in-memory database
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./analytics.db")
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_wal_mode() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_deserialization() {
        let config: StoreConfig = serde_json::from_str(r#"{"type": "memory"}"#).unwrap();
        assert_eq!(config, StoreConfig::Memory);

        let config: StoreConfig =
            serde_json::from_str(r#"{"type": "sqlite", "path": "/var/lib/pulse/events.db"}"#)
                .unwrap();
        match config {
            StoreConfig::Sqlite(sqlite) => {
                assert_eq!(sqlite.path, PathBuf::from("/var/lib/pulse/events.db"));
                assert_eq!(sqlite.operation_timeout(), Duration::from_secs(5));
                assert!(sqlite.wal_mode);
            }
            other => panic!("expected sqlite config, got {other:?}"),
        }
    }

    #[test]
    fn test_in_memory_path() {
        assert!(SqliteConfig {
            path: PathBuf::from(":memory:"),
            ..SqliteConfig::default()
        }
        .is_in_memory());
        assert!(!SqliteConfig::default().is_in_memory());
    }
}
