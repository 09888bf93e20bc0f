//! SQLite event store
//!
//! One table per event kind. Timestamps are stored as Unix milliseconds so
//! window filters are plain integer comparisons on an indexed column. Every
//! operation runs on the `tokio-rusqlite` background thread and is bounded by
//! the configured operation timeout. Aggregates are computed by SQLite with
//! `GROUP BY` rather than by loading rows.

use crate::config::SqliteConfig;
use crate::error::{Result, StorageError};
use crate::traits::{
    ActionGroup, EventFilter, EventStore, GroupBy, GroupKey, Order, ReplacementGroup,
    ReplacementTally,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::{
    Clock, ErrorEvent, EventId, NewError, NewReplacement, NewUserAction, ReplacementEvent,
    UserActionEvent,
};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Row};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_rusqlite::Connection as AsyncConnection;
use tracing::{debug, info};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS text_replacements (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp_ms INTEGER NOT NULL,
        user_id TEXT NOT NULL,
        app_version TEXT,
        os TEXT,
        success INTEGER NOT NULL,
        method TEXT NOT NULL,
        target_app TEXT NOT NULL,
        text_length INTEGER NOT NULL DEFAULT 0,
        response_time_ms INTEGER NOT NULL DEFAULT 0,
        user_agent TEXT,
        ip_address TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_replacements_user ON text_replacements(user_id);
    CREATE INDEX IF NOT EXISTS idx_replacements_timestamp ON text_replacements(timestamp_ms);
    CREATE INDEX IF NOT EXISTS idx_replacements_target_app ON text_replacements(target_app);
    CREATE INDEX IF NOT EXISTS idx_replacements_method ON text_replacements(method);

    CREATE TABLE IF NOT EXISTS errors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp_ms INTEGER NOT NULL,
        user_id TEXT NOT NULL,
        app_version TEXT,
        os TEXT,
        error_type TEXT NOT NULL,
        error_message TEXT NOT NULL,
        target_app TEXT,
        stack_trace TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_errors_user ON errors(user_id);
    CREATE INDEX IF NOT EXISTS idx_errors_timestamp ON errors(timestamp_ms);
    CREATE INDEX IF NOT EXISTS idx_errors_type ON errors(error_type);

    CREATE TABLE IF NOT EXISTS user_actions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp_ms INTEGER NOT NULL,
        user_id TEXT NOT NULL,
        action_type TEXT NOT NULL,
        target_app TEXT,
        app_version TEXT,
        os TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_user_actions_user ON user_actions(user_id);
    CREATE INDEX IF NOT EXISTS idx_user_actions_timestamp ON user_actions(timestamp_ms);
    CREATE INDEX IF NOT EXISTS idx_user_actions_type ON user_actions(action_type);
";

const REPLACEMENT_COLUMNS: &str = "id, timestamp_ms, user_id, app_version, os, success, method, \
     target_app, text_length, response_time_ms, user_agent, ip_address";
const ERROR_COLUMNS: &str =
    "id, timestamp_ms, user_id, app_version, os, error_type, error_message, target_app, stack_trace";
const USER_ACTION_COLUMNS: &str =
    "id, timestamp_ms, user_id, action_type, target_app, app_version, os";

/// SQLite-backed event store
pub struct SqliteEventStore {
    connection: Arc<AsyncConnection>,
    clock: Arc<dyn Clock>,
    operation_timeout: Duration,
    busy_timeout: Duration,
}

impl SqliteEventStore {
    /// Open (or create) the database described by `config`.
    ///
    /// The schema is not created here; call [`EventStore::ensure_schema`] or
    /// go through [`crate::open_store`].
    pub async fn open(config: &SqliteConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let operation_timeout = config.operation_timeout();

        let connection = if config.is_in_memory() {
            AsyncConnection::open_in_memory().await
        } else {
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    StorageError::Unavailable(format!(
                        "Failed to create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
            AsyncConnection::open(&config.path).await
        }
        .map_err(|e| {
            StorageError::Unavailable(format!(
                "Failed to open SQLite database {}: {e}",
                config.path.display()
            ))
        })?;

        let store = Self {
            connection: Arc::new(connection),
            clock,
            operation_timeout,
            // A lock wait may never outlast the operation it belongs to
            busy_timeout: config.busy_timeout().min(operation_timeout),
        };

        let wal_mode = config.wal_mode && !config.is_in_memory();
        let journal_mode = store
            .run("configure", move |conn| {
                if wal_mode {
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                        row.get::<_, String>(0)
                    })
                } else {
                    conn.query_row("PRAGMA journal_mode", [], |row| row.get::<_, String>(0))
                }
            })
            .await?;

        debug!(
            path = %config.path.display(),
            journal_mode = %journal_mode,
            busy_timeout_ms = store.busy_timeout.as_millis() as u64,
            operation_timeout_ms = config.operation_timeout_ms,
            "Opened SQLite event store"
        );

        Ok(store)
    }

    /// Run `f` on the connection thread within the operation budget.
    ///
    /// The budget starts when this is called. If it is spent before `f`
    /// reaches the connection, `f` never runs; once `f` runs, SQLite's busy
    /// wait is capped at what is left. A write therefore either commits
    /// inside the budget or fails with nothing written.
    async fn run<F, R>(&self, operation: &'static str, f: F) -> Result<R>
    where
        F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let deadline = Instant::now() + self.operation_timeout;
        let busy_cap = self.busy_timeout;

        let outcome = self
            .connection
            .call(move |conn| {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Ok(None);
                }
                let wait = remaining.min(busy_cap);
                conn.busy_timeout(wait)?;
                match f(conn) {
                    Ok(value) => Ok(Some(value)),
                    Err(err) if wait == remaining && is_busy(&err) => Ok(None),
                    Err(err) => Err(err.into()),
                }
            })
            .await?;

        outcome.ok_or(StorageError::Timeout {
            operation,
            elapsed: self.operation_timeout,
        })
    }

    /// [`Self::run`] for statements without side effects. These may also be
    /// abandoned while executing once the budget is spent.
    async fn read<F, R>(&self, operation: &'static str, f: F) -> Result<R>
    where
        F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        tokio::time::timeout(self.operation_timeout, self.run(operation, f))
            .await
            .unwrap_or(Err(StorageError::Timeout {
                operation,
                elapsed: self.operation_timeout,
            }))
    }

    async fn select<T, M>(
        &self,
        operation: &'static str,
        table: &'static str,
        columns: &'static str,
        filter: &EventFilter,
        map: M,
    ) -> Result<Vec<T>>
    where
        T: Send + 'static,
        M: Fn(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
    {
        let (clause, args) = window_clause(filter);
        let direction = match filter.order {
            Order::OldestFirst => "ASC",
            Order::NewestFirst => "DESC",
        };
        let mut sql = format!("SELECT {columns} FROM {table}{clause} ORDER BY id {direction}");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        self.read(operation, move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(args.iter()), |row| map(row))?
                .collect::<rusqlite::Result<Vec<T>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn count(
        &self,
        operation: &'static str,
        table: &'static str,
        filter: &EventFilter,
    ) -> Result<u64> {
        let (clause, args) = window_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM {table}{clause}");

        self.read(operation, move |conn| {
            conn.query_row(&sql, params_from_iter(args.iter()), |row| unsigned(row, 0))
        })
        .await
    }
}

impl std::fmt::Debug for SqliteEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEventStore")
            .field("operation_timeout", &self.operation_timeout)
            .field("busy_timeout", &self.busy_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.run("ensure_schema", |conn| conn.execute_batch(SCHEMA))
            .await
            .map_err(|e| match e {
                StorageError::Query(msg) => StorageError::Schema(msg),
                other => other,
            })?;

        info!("SQLite schema ready");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.read("ping", |conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    async fn append_replacement(&self, event: NewReplacement) -> Result<EventId> {
        let at = self.clock.now().timestamp_millis();
        self.run("append_replacement", move |conn| {
            conn.execute(
                "INSERT INTO text_replacements (timestamp_ms, user_id, app_version, os, success, \
                 method, target_app, text_length, response_time_ms, user_agent, ip_address)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    at,
                    event.user_id,
                    event.app_version,
                    event.os,
                    event.success,
                    event.method,
                    event.target_app,
                    signed(event.text_length),
                    signed(event.response_time_ms),
                    event.user_agent,
                    event.ip_address,
                ],
            )?;
            Ok(EventId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn append_error(&self, event: NewError) -> Result<EventId> {
        let at = self.clock.now().timestamp_millis();
        self.run("append_error", move |conn| {
            conn.execute(
                "INSERT INTO errors (timestamp_ms, user_id, app_version, os, error_type, \
                 error_message, target_app, stack_trace)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    at,
                    event.user_id,
                    event.app_version,
                    event.os,
                    event.error_type,
                    event.error_message,
                    event.target_app,
                    event.stack_trace,
                ],
            )?;
            Ok(EventId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn append_user_action(&self, event: NewUserAction) -> Result<EventId> {
        let at = self.clock.now().timestamp_millis();
        self.run("append_user_action", move |conn| {
            conn.execute(
                "INSERT INTO user_actions (timestamp_ms, user_id, action_type, target_app, \
                 app_version, os)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    at,
                    event.user_id,
                    event.action_type,
                    event.target_app,
                    event.app_version,
                    event.os,
                ],
            )?;
            Ok(EventId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn replacements(&self, filter: &EventFilter) -> Result<Vec<ReplacementEvent>> {
        self.select(
            "replacements",
            "text_replacements",
            REPLACEMENT_COLUMNS,
            filter,
            replacement_from_row,
        )
        .await
    }

    async fn errors(&self, filter: &EventFilter) -> Result<Vec<ErrorEvent>> {
        self.select("errors", "errors", ERROR_COLUMNS, filter, error_from_row)
            .await
    }

    async fn user_actions(&self, filter: &EventFilter) -> Result<Vec<UserActionEvent>> {
        self.select(
            "user_actions",
            "user_actions",
            USER_ACTION_COLUMNS,
            filter,
            user_action_from_row,
        )
        .await
    }

    async fn count_replacements(&self, filter: &EventFilter) -> Result<u64> {
        self.count("count_replacements", "text_replacements", filter)
            .await
    }

    async fn count_errors(&self, filter: &EventFilter) -> Result<u64> {
        self.count("count_errors", "errors", filter).await
    }

    async fn count_user_actions(&self, filter: &EventFilter) -> Result<u64> {
        self.count("count_user_actions", "user_actions", filter)
            .await
    }

    async fn summarize_replacements(&self, filter: &EventFilter) -> Result<ReplacementTally> {
        let (clause, args) = window_clause(filter);
        let sql = format!("SELECT {TALLY_COLUMNS} FROM text_replacements{clause}");

        self.read("summarize_replacements", move |conn| {
            conn.query_row(&sql, params_from_iter(args.iter()), |row| tally(row, 0))
        })
        .await
    }

    async fn group_replacements(
        &self,
        filter: &EventFilter,
        by: GroupBy,
    ) -> Result<Vec<ReplacementGroup>> {
        let (clause, args) = window_clause(filter);
        let sql = format!(
            "SELECT {} AS bucket, {TALLY_COLUMNS} FROM text_replacements{clause} \
             GROUP BY bucket ORDER BY bucket",
            group_expr(by)
        );

        self.read("group_replacements", move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let groups = stmt
                .query_map(params_from_iter(args.iter()), |row| {
                    Ok(ReplacementGroup {
                        key: group_key(row, by)?,
                        tally: tally(row, 1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(groups)
        })
        .await
    }

    async fn group_user_actions(&self, filter: &EventFilter) -> Result<Vec<ActionGroup>> {
        let (clause, args) = window_clause(filter);
        let sql = format!(
            "SELECT action_type, COUNT(*), COUNT(DISTINCT user_id) FROM user_actions{clause} \
             GROUP BY action_type ORDER BY action_type"
        );

        self.read("group_user_actions", move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let groups = stmt
                .query_map(params_from_iter(args.iter()), |row| {
                    Ok(ActionGroup {
                        action_type: row.get(0)?,
                        count: unsigned(row, 1)?,
                        unique_users: unsigned(row, 2)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(groups)
        })
        .await
    }
}

const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_DAY: i64 = 86_400_000;

/// Aggregate columns decoded by [`tally`]
const TALLY_COLUMNS: &str = "COUNT(*), COALESCE(SUM(success), 0), \
     COALESCE(SUM(response_time_ms), 0), COUNT(DISTINCT user_id), MAX(timestamp_ms)";

fn group_expr(by: GroupBy) -> String {
    match by {
        GroupBy::User => "user_id".to_string(),
        GroupBy::TargetApp => "target_app".to_string(),
        GroupBy::Method => "method".to_string(),
        GroupBy::Day => format!("timestamp_ms / {MS_PER_DAY}"),
        GroupBy::Minute => format!("timestamp_ms / {MS_PER_MINUTE}"),
    }
}

fn group_key(row: &Row<'_>, by: GroupBy) -> rusqlite::Result<GroupKey> {
    match by {
        GroupBy::User | GroupBy::TargetApp | GroupBy::Method => Ok(GroupKey::Text(row.get(0)?)),
        GroupBy::Day => {
            let day: i64 = row.get(0)?;
            Ok(GroupKey::Day(millis(day.saturating_mul(MS_PER_DAY), 0)?.date_naive()))
        }
        GroupBy::Minute => {
            let minute: i64 = row.get(0)?;
            Ok(GroupKey::Minute(millis(minute.saturating_mul(MS_PER_MINUTE), 0)?))
        }
    }
}

fn tally(row: &Row<'_>, offset: usize) -> rusqlite::Result<ReplacementTally> {
    let last_seen: Option<i64> = row.get(offset + 4)?;
    Ok(ReplacementTally {
        count: unsigned(row, offset)?,
        successes: unsigned(row, offset + 1)?,
        response_total_ms: unsigned(row, offset + 2)?,
        unique_users: unsigned(row, offset + 3)?,
        last_seen: last_seen.map(|ms| millis(ms, offset + 4)).transpose()?,
    })
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _) if code.code == rusqlite::ErrorCode::DatabaseBusy
    )
}

/// `WHERE` clause and positional arguments for the filter's time window
fn window_clause(filter: &EventFilter) -> (String, Vec<i64>) {
    let mut clauses = Vec::new();
    let mut args = Vec::new();

    if let Some(since) = filter.since {
        args.push(since.timestamp_millis());
        clauses.push(format!("timestamp_ms >= ?{}", args.len()));
    }
    if let Some(until) = filter.until {
        args.push(until.timestamp_millis());
        clauses.push(format!("timestamp_ms < ?{}", args.len()));
    }

    if clauses.is_empty() {
        (String::new(), args)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), args)
    }
}

fn signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn unsigned(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    millis(row.get(idx)?, idx)
}

fn millis(ms: i64, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {ms} is out of range").into(),
        )
    })
}

fn replacement_from_row(row: &Row<'_>) -> rusqlite::Result<ReplacementEvent> {
    Ok(ReplacementEvent {
        id: EventId(row.get(0)?),
        timestamp: timestamp(row, 1)?,
        user_id: row.get(2)?,
        app_version: row.get(3)?,
        os: row.get(4)?,
        success: row.get(5)?,
        method: row.get(6)?,
        target_app: row.get(7)?,
        text_length: unsigned(row, 8)?,
        response_time_ms: unsigned(row, 9)?,
        user_agent: row.get(10)?,
        ip_address: row.get(11)?,
    })
}

fn error_from_row(row: &Row<'_>) -> rusqlite::Result<ErrorEvent> {
    Ok(ErrorEvent {
        id: EventId(row.get(0)?),
        timestamp: timestamp(row, 1)?,
        user_id: row.get(2)?,
        app_version: row.get(3)?,
        os: row.get(4)?,
        error_type: row.get(5)?,
        error_message: row.get(6)?,
        target_app: row.get(7)?,
        stack_trace: row.get(8)?,
    })
}

fn user_action_from_row(row: &Row<'_>) -> rusqlite::Result<UserActionEvent> {
    Ok(UserActionEvent {
        id: EventId(row.get(0)?),
        timestamp: timestamp(row, 1)?,
        user_id: row.get(2)?,
        action_type: row.get(3)?,
        target_app: row.get(4)?,
        app_version: row.get(5)?,
        os: row.get(6)?,
    })
}
