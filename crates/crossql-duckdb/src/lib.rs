//! # crossql-duckdb
//!
//! DuckDB backend for crossql: a [`crossql_core::Database`] that compiles
//! with [`crossql_core::DuckDbDialect`] and runs statements on a bundled
//! DuckDB connection.
//!
//! ```rust
//! use crossql_core::builder::{table, Relation};
//! use crossql_core::{Database, Value};
//! use crossql_duckdb::DuckDb;
//!
//! let db = DuckDb::in_memory().unwrap();
//! let t = table(["numbers"], None).unwrap();
//! db.execute("CREATE TABLE numbers (n INTEGER)").unwrap();
//! db.query(t.insert_row([1_i64], None).into()).unwrap();
//!
//! let rows = db.query(t.count().into()).unwrap();
//! assert_eq!(rows, vec![vec![Value::Int(1)]]);
//! ```

mod config;
mod database;

pub use config::{DuckDbConfig, URI_HELP};
pub use database::DuckDb;
