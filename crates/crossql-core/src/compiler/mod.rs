//! SQL compilation.
//!
//! A [`Compiler`] is an immutable context passed down the tree. Each node
//! derives the context its children need (inside a SELECT, inside a JOIN,
//! with more tables in scope) instead of mutating shared state. The only
//! shared part is a [`Scope`] owned by one top-level [`Compiler::compile`]
//! call, which hands out unique names and collects CTE bodies.

mod expression;
mod statement;
mod table;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use crate::ast::{Expr, Node, Select, Table, TableAlias};
use crate::dialect::Dialect;
use crate::error::{Error, Result};

/// Values for [`Expr::Param`] and [`TableParam`](crate::ast::TableParam) nodes.
pub type Params = HashMap<String, Node>;

/// A node that renders to SQL.
pub trait Compilable {
    /// Renders the node in the context `c`.
    ///
    /// # Errors
    ///
    /// Returns the first error met anywhere in the subtree.
    fn compile(&self, c: &Compiler<'_>) -> Result<String>;
}

/// State shared by one top-level compilation.
#[derive(Debug, Default)]
struct Scope {
    counter: Cell<u32>,
    ctes: RefCell<Vec<(String, String)>>,
}

impl Scope {
    fn next_name(&self, prefix: &str) -> String {
        let n = self.counter.get() + 1;
        self.counter.set(n);
        format!("{prefix}{n}")
    }

    fn add_cte(&self, key: String, body: String) {
        let mut ctes = self.ctes.borrow_mut();
        match ctes.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = body,
            None => ctes.push((key, body)),
        }
    }

    fn take_ctes(&self) -> Vec<(String, String)> {
        self.ctes.take()
    }
}

/// Compilation context.
#[derive(Clone)]
pub struct Compiler<'a> {
    dialect: &'a dyn Dialect,
    params: Option<&'a Params>,
    autocommit: bool,
    root: bool,
    in_select: bool,
    in_join: bool,
    table_context: Vec<Arc<TableAlias>>,
    scope: Rc<Scope>,
}

impl<'a> Compiler<'a> {
    /// Creates a root compiler for `dialect`.
    #[must_use]
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            dialect,
            params: None,
            autocommit: false,
            root: true,
            in_select: false,
            in_join: false,
            table_context: Vec::new(),
            scope: Rc::new(Scope::default()),
        }
    }

    /// Supplies values for parameter nodes.
    #[must_use]
    pub const fn with_params(mut self, params: &'a Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Whether the target database commits every statement itself.
    #[must_use]
    pub const fn autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }

    #[must_use]
    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    #[must_use]
    pub const fn is_autocommit(&self) -> bool {
        self.autocommit
    }

    /// Compiles `node` to SQL.
    ///
    /// At the root, expressions are wrapped as `SELECT expr` and bare
    /// relations as `SELECT * FROM relation`, and collected CTEs are
    /// prepended as a `WITH` clause.
    ///
    /// # Errors
    ///
    /// Fails on unbound placeholders, missing parameters, ambiguous
    /// columns and type mismatches. No partial SQL is returned.
    pub fn compile(&self, node: impl Into<Node>) -> Result<String> {
        let node = node.into();
        if !self.root {
            return self.sql(&node);
        }

        let c = Self {
            root: false,
            scope: Rc::new(Scope::default()),
            ..self.clone()
        };
        let body = c.sql(&as_root(node))?;
        let ctes = c.scope.take_ctes();
        let sql = if ctes.is_empty() {
            body
        } else {
            let defs: Vec<String> = ctes
                .into_iter()
                .map(|(name, cte)| format!("\n  {name} AS ({cte})"))
                .collect();
            format!("WITH {}\n{body}", defs.join(", "))
        };
        debug!(dialect = self.dialect.name(), %sql, "Compiled query");
        Ok(sql)
    }

    /// Compiles a child node in this context.
    pub(crate) fn sql(&self, node: &(impl Compilable + ?Sized)) -> Result<String> {
        node.compile(self)
    }

    /// Compiles each node and joins the results with `sep`.
    pub(crate) fn sql_list<T: Compilable>(&self, nodes: &[T], sep: &str) -> Result<String> {
        let parts = nodes
            .iter()
            .map(|node| self.sql(node))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(sep))
    }

    pub(crate) fn with_flags(&self, in_select: bool, in_join: bool) -> Self {
        Self {
            in_select,
            in_join,
            ..self.clone()
        }
    }

    pub(crate) fn with_tables(&self, tables: &[Arc<TableAlias>]) -> Self {
        let mut c = self.clone();
        c.table_context.extend(tables.iter().cloned());
        c
    }

    pub(crate) fn without_tables(&self) -> Self {
        Self {
            table_context: Vec::new(),
            ..self.clone()
        }
    }

    pub(crate) fn table_context(&self) -> &[Arc<TableAlias>] {
        &self.table_context
    }

    pub(crate) fn add_cte(&self, key: String, body: String) {
        self.scope.add_cte(key, body);
    }

    pub(crate) fn param(&self, name: &str) -> Result<&'a Node> {
        self.params
            .and_then(|params| params.get(name))
            .ok_or_else(|| Error::MissingParam(String::from(name)))
    }

    /// Returns `tmp1`, `tmp2`, … unique within one top-level compilation.
    #[must_use]
    pub fn new_unique_name(&self) -> String {
        self.scope.next_name("tmp")
    }

    #[must_use]
    pub fn quote(&self, name: &str) -> String {
        self.dialect.quote(name)
    }

    /// Parenthesizes a table expression according to where it is nested.
    pub(crate) fn wrap_table(&self, sql: String) -> String {
        if self.in_select {
            format!("({sql}) {}", self.new_unique_name())
        } else if self.in_join {
            format!("({sql})")
        } else {
            sql
        }
    }
}

impl core::fmt::Debug for Compiler<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Compiler")
            .field("dialect", &self.dialect.name())
            .field("autocommit", &self.autocommit)
            .field("root", &self.root)
            .field("in_select", &self.in_select)
            .field("in_join", &self.in_join)
            .field("tables", &self.table_context.len())
            .finish_non_exhaustive()
    }
}

/// Turns a relation that is not a query on its own into `SELECT * FROM it`.
pub(crate) fn as_query(table: &Table) -> Table {
    match table {
        Table::Path(_) | Table::Alias(_) | Table::Cte(_) | Table::Param(_) => {
            Select::new(Some(table.clone())).into()
        }
        _ => table.clone(),
    }
}

fn as_root(node: Node) -> Node {
    match node {
        Node::Expr(Expr::Code(_)) | Node::Statement(_) => node,
        Node::Expr(e) => Node::Table(Select::columns_only(vec![e]).into()),
        Node::Table(t) => Node::Table(as_query(&t)),
    }
}

impl Compilable for Node {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        match self {
            Self::Expr(e) => c.sql(e),
            Self::Table(t) => c.sql(t),
            Self::Statement(s) => c.sql(s),
        }
    }
}

impl<T: Compilable + ?Sized> Compilable for Arc<T> {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        (**self).compile(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DuckDbDialect;

    #[test]
    fn test_unique_names_restart_per_compile() {
        let dialect = DuckDbDialect::new();
        let c = Compiler::new(&dialect);
        assert_eq!(c.new_unique_name(), "tmp1");
        assert_eq!(c.new_unique_name(), "tmp2");
    }

    #[test]
    fn test_missing_param() {
        let dialect = DuckDbDialect::new();
        let err = Compiler::new(&dialect)
            .compile(Expr::Param(String::from("x")))
            .unwrap_err();
        assert!(matches!(err, Error::MissingParam(name) if name == "x"));
    }

    #[test]
    fn test_root_expression_is_selected() {
        let dialect = DuckDbDialect::new();
        let sql = Compiler::new(&dialect).compile(Expr::from(1)).unwrap();
        assert_eq!(sql, "SELECT 1");
        let sql = Compiler::new(&dialect)
            .compile(Expr::Code(String::from("SELECT 2")))
            .unwrap();
        assert_eq!(sql, "SELECT 2");
    }
}
