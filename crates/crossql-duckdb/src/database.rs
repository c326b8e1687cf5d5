//! The DuckDB [`Database`] implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate};
use duckdb::types::{TimeUnit, Value as DuckValue};
use duckdb::Connection;
use tracing::{debug, info};

use crossql_core::{Database, Dialect, DuckDbDialect, Error, Result, Row, Value};

use crate::config::DuckDbConfig;

/// Statements that produce a result set.
const ROW_PREFIXES: [&str; 7] = [
    "SELECT", "WITH", "EXPLAIN", "VALUES", "SHOW", "DESCRIBE", "PRAGMA",
];

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A DuckDB connection.
///
/// DuckDB commits each statement on its own, so [`Database::is_autocommit`]
/// is always true.
pub struct DuckDb {
    conn: Mutex<Option<Connection>>,
    config: DuckDbConfig,
    dialect: DuckDbDialect,
}

impl DuckDb {
    /// Opens the database described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] when DuckDB cannot open the database.
    pub fn connect(config: DuckDbConfig) -> Result<Self> {
        info!(
            database = %config.database,
            filepath = %config.filepath,
            "Connecting to DuckDB"
        );
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.filepath)
        }
        .map_err(|e| Error::Connect(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            config,
            dialect: DuckDbDialect::new(),
        })
    }

    /// Opens, or creates, the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] when DuckDB cannot open the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::connect(DuckDbConfig::file(path.as_ref().to_string_lossy()))
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] when DuckDB cannot start.
    pub fn in_memory() -> Result<Self> {
        Self::connect(DuckDbConfig::default())
    }

    #[must_use]
    pub const fn config(&self) -> &DuckDbConfig {
        &self.config
    }

    fn with_conn<T>(
        &self,
        sql: &str,
        f: impl FnOnce(&Connection) -> duckdb::Result<T>,
    ) -> Result<T> {
        let guard = self.conn.lock().map_err(|e| Error::Execution {
            sql: sql.to_owned(),
            message: format!("connection lock poisoned: {e}"),
        })?;
        let conn = guard.as_ref().ok_or_else(|| Error::Execution {
            sql: sql.to_owned(),
            message: String::from("connection is closed"),
        })?;
        f(conn).map_err(|e| Error::Execution {
            sql: sql.to_owned(),
            message: e.to_string(),
        })
    }
}

impl core::fmt::Debug for DuckDb {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DuckDb")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn returns_rows(sql: &str) -> bool {
    let head = sql.trim_start().to_ascii_uppercase();
    ROW_PREFIXES.iter().any(|prefix| head.starts_with(prefix))
}

fn fetch(conn: &Connection, sql: &str) -> duckdb::Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| {
            let columns = row.as_ref().column_count();
            (0..columns)
                .map(|i| row.get::<_, DuckValue>(i).map(to_value))
                .collect::<duckdb::Result<Row>>()
        })?
        .collect::<duckdb::Result<Vec<_>>>()?;
    Ok(rows)
}

fn timestamp_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn to_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(n) => Value::Int(n.into()),
        DuckValue::SmallInt(n) => Value::Int(n.into()),
        DuckValue::Int(n) => Value::Int(n.into()),
        DuckValue::BigInt(n) => Value::Int(n),
        DuckValue::UTinyInt(n) => Value::Int(n.into()),
        DuckValue::USmallInt(n) => Value::Int(n.into()),
        DuckValue::UInt(n) => Value::Int(n.into()),
        DuckValue::HugeInt(n) => {
            i64::try_from(n).map_or_else(|_| Value::Text(n.to_string()), Value::Int)
        }
        DuckValue::UBigInt(n) => {
            i64::try_from(n).map_or_else(|_| Value::Text(n.to_string()), Value::Int)
        }
        DuckValue::Float(f) => Value::Float(f.into()),
        DuckValue::Double(f) => Value::Float(f),
        DuckValue::Decimal(d) => Value::Text(d.to_string()),
        DuckValue::Text(s) | DuckValue::Enum(s) => Value::Text(s),
        DuckValue::Blob(b) => Value::Bytes(b),
        DuckValue::Timestamp(unit, n) => {
            let micros = timestamp_micros(unit, n);
            DateTime::from_timestamp_micros(micros)
                .map_or_else(|| Value::Int(micros), |t| Value::Timestamp(t.naive_utc()))
        }
        DuckValue::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map_or(Value::Int(days.into()), |d| Value::Text(d.to_string())),
        other => Value::Text(format!("{other:?}")),
    }
}

impl Database for DuckDb {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn is_autocommit(&self) -> bool {
        true
    }

    fn default_schema(&self) -> &str {
        "main"
    }

    fn execute(&self, sql: &str) -> Result<Vec<Row>> {
        debug!(sql, "Executing on DuckDB");
        if returns_rows(sql) {
            self.with_conn(sql, |conn| fetch(conn, sql))
        } else {
            self.with_conn(sql, |conn| conn.execute_batch(sql))?;
            Ok(Vec::new())
        }
    }

    fn close(&self) -> Result<()> {
        let mut guard = self.conn.lock().map_err(|e| Error::Execution {
            sql: String::new(),
            message: format!("connection lock poisoned: {e}"),
        })?;
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| Error::Execution {
                sql: String::new(),
                message: e.to_string(),
            })?;
            info!(database = %self.config.database, "Closed DuckDB connection");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_rows() {
        assert!(returns_rows("SELECT 1"));
        assert!(returns_rows("  with x AS (SELECT 1) SELECT * FROM x"));
        assert!(returns_rows("EXPLAIN SELECT 1"));
        assert!(!returns_rows("CREATE TABLE t (a INT)"));
        assert!(!returns_rows("INSERT INTO t VALUES (1)"));
    }

    #[test]
    fn test_timestamp_micros() {
        assert_eq!(timestamp_micros(TimeUnit::Second, 2), 2_000_000);
        assert_eq!(timestamp_micros(TimeUnit::Nanosecond, 2_000), 2);
    }

    #[test]
    fn test_to_value() {
        assert_eq!(to_value(DuckValue::Int(3)), Value::Int(3));
        assert_eq!(to_value(DuckValue::Null), Value::Null);
        assert_eq!(to_value(DuckValue::Date32(0)), Value::from("1970-01-01"));
        assert_eq!(
            to_value(DuckValue::Text(String::from("x"))),
            Value::from("x")
        );
    }
}
