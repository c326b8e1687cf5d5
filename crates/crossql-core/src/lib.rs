//! # crossql-core
//!
//! A cross-database SQL query builder.
//!
//! Queries are built as an immutable tree ([`ast`]) with the [`builder`]
//! API, then rendered for one database by a [`Compiler`] and a [`Dialect`].
//! Column names can be left to resolve lazily with [`builder::this`]; they
//! bind against the relation the expression is passed to.
//!
//! ## Example
//!
//! ```rust
//! use crossql_core::builder::{table, this, Relation};
//! use crossql_core::{Compiler, DuckDbDialect, Schema, SemanticType};
//!
//! let users = table(
//!     ["users"],
//!     Some(
//!         Schema::case_insensitive()
//!             .with_column("id", SemanticType::Integer)
//!             .with_column("name", SemanticType::Text),
//!     ),
//! )
//! .unwrap();
//!
//! let query = users
//!     .where_([this("ID").gt(10)])
//!     .unwrap()
//!     .order_by([this("name")])
//!     .unwrap()
//!     .limit(5);
//!
//! let dialect = DuckDbDialect::new();
//! let sql = Compiler::new(&dialect).compile(query).unwrap();
//! assert_eq!(
//!     sql,
//!     r#"SELECT * FROM "users" WHERE ("id" > 10) ORDER BY "name" LIMIT 5"#
//! );
//! ```

pub mod ast;
pub mod builder;
pub mod compiler;
pub mod database;
pub mod dialect;
pub mod error;
pub mod schema;

pub use ast::{Expr, Node, Row, SemanticType, Statement, Table, Value};
pub use compiler::{Compilable, Compiler, Params};
pub use database::Database;
pub use dialect::{Dialect, DuckDbDialect};
pub use error::{Error, ErrorKind, Result};
pub use schema::{DbPath, Schema};
