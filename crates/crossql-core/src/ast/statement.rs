//! DDL and DML statements, and the top-level [`Node`] union.

use super::expression::Expr;
use super::table::{
    Cte, GroupBy, Join, Select, Table, TableAlias, TableOp, TableParam, TablePath,
};
use super::value::{Row, Value};

/// `CREATE TABLE path (columns..)` or `CREATE TABLE path AS query`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreateTable {
    pub path: TablePath,
    pub source: Option<Table>,
    pub if_not_exists: bool,
    pub primary_keys: Vec<String>,
}

impl CreateTable {
    /// Adds `IF NOT EXISTS`.
    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Sets the primary key columns.
    #[must_use]
    pub fn primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
        self
    }
}

/// `DROP TABLE [IF EXISTS] path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DropTable {
    pub path: TablePath,
    pub if_exists: bool,
}

impl DropTable {
    /// Adds `IF EXISTS`.
    #[must_use]
    pub const fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }
}

/// `TRUNCATE TABLE path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TruncateTable {
    pub path: TablePath,
}

/// What an INSERT reads from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InsertSource {
    /// Constant rows, rendered as `VALUES`.
    Rows(Vec<Row>),
    /// The result of a query.
    Query(Table),
}

/// `INSERT INTO path[(columns)] source`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InsertToTable {
    pub path: TablePath,
    pub source: InsertSource,
    pub columns: Option<Vec<String>>,
}

/// `EXPLAIN query`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Explain {
    pub query: Table,
}

/// A statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    /// `CREATE TABLE`
    CreateTable(CreateTable),
    /// `DROP TABLE`
    DropTable(DropTable),
    /// `TRUNCATE TABLE`
    TruncateTable(TruncateTable),
    /// `INSERT INTO`
    Insert(InsertToTable),
    /// `COMMIT`; empty when the database is in autocommit mode.
    Commit,
    /// `EXPLAIN`
    Explain(Explain),
}

/// Anything the compiler accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// A scalar expression.
    Expr(Expr),
    /// A relation.
    Table(Table),
    /// A DDL or DML statement.
    Statement(Statement),
}

impl From<Expr> for Node {
    fn from(e: Expr) -> Self {
        Self::Expr(e)
    }
}

impl From<Value> for Node {
    fn from(v: Value) -> Self {
        Self::Expr(Expr::Value(v))
    }
}

impl From<Table> for Node {
    fn from(t: Table) -> Self {
        Self::Table(t)
    }
}

impl From<Statement> for Node {
    fn from(s: Statement) -> Self {
        Self::Statement(s)
    }
}

macro_rules! impl_relation_into_node {
    ($($node:ident),* $(,)?) => {
        $(
            impl From<$node> for Node {
                fn from(node: $node) -> Self {
                    Self::Table(Table::from(node))
                }
            }
        )*
    };
}

impl_relation_into_node!(TablePath, TableAlias, Join, GroupBy, TableOp, Select, Cte, TableParam);

macro_rules! impl_statement_into_node {
    ($($node:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$node> for Statement {
                fn from(node: $node) -> Self {
                    Self::$variant(node)
                }
            }

            impl From<$node> for Node {
                fn from(node: $node) -> Self {
                    Self::Statement(Statement::$variant(node))
                }
            }
        )*
    };
}

impl_statement_into_node!(
    CreateTable => CreateTable,
    DropTable => DropTable,
    TruncateTable => TruncateTable,
    InsertToTable => Insert,
    Explain => Explain,
);
