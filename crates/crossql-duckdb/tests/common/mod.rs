#![allow(dead_code)]

use crossql_core::ast::TablePath;
use crossql_core::builder::table;
use crossql_core::{Database, Row, Schema, SemanticType, Value};
use crossql_duckdb::DuckDb;

pub fn db() -> DuckDb {
    DuckDb::in_memory().unwrap_or_else(|e| panic!("Failed to open DuckDB: {e}"))
}

pub fn users() -> TablePath {
    let schema = Schema::case_insensitive()
        .with_column("id", SemanticType::Integer)
        .with_column("name", SemanticType::Text);
    table(["users"], Some(schema)).unwrap()
}

/// Creates and fills `users` with `(1, 'alice')`, `(2, 'bob')`, `(3, NULL)`.
pub fn seeded() -> DuckDb {
    let db = db();
    let t = users();
    db.query(t.create().unwrap().into()).unwrap();
    db.query(
        t.insert_rows(
            [
                vec![Value::from(1), Value::from("alice")],
                vec![Value::from(2), Value::from("bob")],
                vec![Value::from(3), Value::Null],
            ],
            None,
        )
        .into(),
    )
    .unwrap();
    db
}

pub fn single(rows: &[Row]) -> &Value {
    match rows {
        [row] => match row.as_slice() {
            [value] => value,
            other => panic!("Expected one column, got {other:?}"),
        },
        other => panic!("Expected one row, got {other:?}"),
    }
}
