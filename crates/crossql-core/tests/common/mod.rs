#![allow(dead_code)]

use std::sync::Mutex;

use crossql_core::ast::{Row, TablePath};
use crossql_core::builder::table;
use crossql_core::{Compiler, Database, Dialect, DuckDbDialect, Node, Result, Schema, SemanticType};

pub fn compile(node: impl Into<Node>) -> String {
    let dialect = DuckDbDialect::new();
    let node = node.into();
    Compiler::new(&dialect)
        .compile(node.clone())
        .unwrap_or_else(|e| panic!("Failed to compile: {node:?}\nError: {e:?}"))
}

pub fn compile_err(node: impl Into<Node>) -> crossql_core::Error {
    let dialect = DuckDbDialect::new();
    Compiler::new(&dialect)
        .compile(node)
        .expect_err("Expected a compile error")
}

pub fn users() -> TablePath {
    let schema = Schema::case_insensitive()
        .with_column("id", SemanticType::Integer)
        .with_column("name", SemanticType::Text);
    table(["users"], Some(schema)).unwrap()
}

pub fn orders() -> TablePath {
    let schema = Schema::case_insensitive()
        .with_column("order_id", SemanticType::Integer)
        .with_column("user_id", SemanticType::Integer);
    table(["orders"], Some(schema)).unwrap()
}

/// Records statements instead of running them.
#[derive(Default)]
pub struct RecordingDb {
    pub autocommit: bool,
    pub statements: Mutex<Vec<String>>,
}

impl RecordingDb {
    pub fn autocommit() -> Self {
        Self {
            autocommit: true,
            statements: Mutex::new(Vec::new()),
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

impl Database for RecordingDb {
    fn dialect(&self) -> &dyn Dialect {
        &DuckDbDialect
    }

    fn is_autocommit(&self) -> bool {
        self.autocommit
    }

    fn default_schema(&self) -> &str {
        "main"
    }

    fn execute(&self, sql: &str) -> Result<Vec<Row>> {
        self.statements.lock().unwrap().push(sql.to_owned());
        Ok(Vec::new())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
