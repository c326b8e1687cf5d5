//! Query builder.
//!
//! Free functions create the leaves of a query; the [`Relation`] trait and
//! the methods on [`Expr`] combine them.
//!
//! # Example
//!
//! ```rust
//! use crossql_core::builder::{table, this, Relation};
//! use crossql_core::{Compiler, DuckDbDialect};
//!
//! let dialect = DuckDbDialect::new();
//! let query = table(["t"], None)
//!     .unwrap()
//!     .where_([this("id").gt(5)])
//!     .unwrap()
//!     .select([this("name")])
//!     .unwrap();
//!
//! let sql = Compiler::new(&dialect).compile(query).unwrap();
//! assert_eq!(sql, r#"SELECT "name" FROM "t" WHERE ("id" > 5)"#);
//! ```

mod case;
mod expr;
mod insert;
mod relation;
mod resolve;

use std::sync::Arc;

pub use case::When;
pub use insert::{insert_rows_in_batches, DEFAULT_BATCH_SIZE};
pub use relation::Relation;

use crate::ast::{
    BinOp, BinaryOp, CaseWhen, Cte, Explain, Expr, Func, Join, JoinKind, Statement, Table,
    TableParam, TablePath, UnresolvedColumn,
};
use crate::error::{Error, Result};
use crate::schema::{DbPath, Schema};

use resolve::present;

/// A table addressed by `path`, optionally with a known schema.
///
/// # Errors
///
/// Returns [`Error::EmptyTablePath`] when the path has no segments or an
/// empty one.
pub fn table<I, S>(path: I, schema: Option<Schema>) -> Result<TablePath>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Ok(TablePath::new(DbPath::new(path)?, schema))
}

fn join_kind<I, T>(kind: JoinKind, tables: I) -> Join
where
    I: IntoIterator<Item = T>,
    T: Into<Table>,
{
    Join::new(tables.into_iter().map(Into::into).collect(), kind)
}

/// Joins each table into one relation.
pub fn join<I, T>(tables: I) -> Join
where
    I: IntoIterator<Item = T>,
    T: Into<Table>,
{
    join_kind(JoinKind::Inner, tables)
}

pub fn leftjoin<I, T>(tables: I) -> Join
where
    I: IntoIterator<Item = T>,
    T: Into<Table>,
{
    join_kind(JoinKind::Left, tables)
}

pub fn rightjoin<I, T>(tables: I) -> Join
where
    I: IntoIterator<Item = T>,
    T: Into<Table>,
{
    join_kind(JoinKind::Right, tables)
}

pub fn outerjoin<I, T>(tables: I) -> Join
where
    I: IntoIterator<Item = T>,
    T: Into<Table>,
{
    join_kind(JoinKind::FullOuter, tables)
}

/// A common table expression over `source`.
///
/// Without a name, a unique one is generated at compile time.
#[must_use]
pub fn cte(source: impl Into<Table>, name: Option<&str>, params: Option<Vec<String>>) -> Cte {
    Cte::new(source.into(), name.map(String::from), params)
}

/// A column placeholder, bound by the next builder call it is passed to.
#[must_use]
pub fn this(name: &str) -> Expr {
    Expr::Unresolved(Arc::new(UnresolvedColumn::new(name)))
}

/// Raw SQL.
#[must_use]
pub fn code(sql: impl Into<String>) -> Expr {
    Expr::Code(sql.into())
}

/// A value supplied through [`Compiler::with_params`](crate::Compiler::with_params).
#[must_use]
pub fn param(name: impl Into<String>) -> Expr {
    Expr::Param(name.into())
}

/// A relation supplied through [`Compiler::with_params`](crate::Compiler::with_params).
#[must_use]
pub fn table_param(name: impl Into<String>) -> TableParam {
    TableParam::new(name)
}

fn bool_op<I, E>(op: BinaryOp, exprs: I) -> Result<Expr>
where
    I: IntoIterator<Item = E>,
    E: Into<Option<Expr>>,
{
    let mut exprs = present(exprs);
    match exprs.len() {
        0 => Err(Error::Builder(format!("{} requires an argument", op.as_str()))),
        1 => Ok(exprs.remove(0)),
        _ => Ok(Expr::BinOp(Arc::new(BinOp { op, args: exprs }))),
    }
}

/// ORs the predicates together. A single predicate is returned as is.
///
/// # Errors
///
/// Returns [`Error::Builder`] when every predicate was skipped.
pub fn or_<I, E>(exprs: I) -> Result<Expr>
where
    I: IntoIterator<Item = E>,
    E: Into<Option<Expr>>,
{
    bool_op(BinaryOp::Or, exprs)
}

/// ANDs the predicates together. A single predicate is returned as is.
///
/// # Errors
///
/// Returns [`Error::Builder`] when every predicate was skipped.
pub fn and_<I, E>(exprs: I) -> Result<Expr>
where
    I: IntoIterator<Item = E>,
    E: Into<Option<Expr>>,
{
    bool_op(BinaryOp::And, exprs)
}

fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Func(Arc::new(Func {
        name: String::from(name),
        args,
    }))
}

#[must_use]
pub fn sum_(expr: impl Into<Expr>) -> Expr {
    func("sum", vec![expr.into()])
}

#[must_use]
pub fn avg(expr: impl Into<Expr>) -> Expr {
    func("avg", vec![expr.into()])
}

#[must_use]
pub fn min_(expr: impl Into<Expr>) -> Expr {
    func("min", vec![expr.into()])
}

#[must_use]
pub fn max_(expr: impl Into<Expr>) -> Expr {
    func("max", vec![expr.into()])
}

#[must_use]
pub fn coalesce<I, E>(exprs: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    func("COALESCE", exprs.into_iter().map(Into::into).collect())
}

/// `CASE WHEN cond THEN then [ELSE otherwise] END`
///
/// # Errors
///
/// Returns [`Error::Type`] when the branch types disagree.
pub fn if_(
    cond: impl Into<Expr>,
    then: impl Into<Expr>,
    otherwise: impl Into<Option<Expr>>,
) -> Result<CaseWhen> {
    let case = when([cond.into()])?.then(then)?;
    match otherwise.into() {
        Some(otherwise) => case.else_(otherwise),
        None => Ok(case),
    }
}

/// Starts a `CASE` expression.
///
/// # Errors
///
/// Returns [`Error::Builder`] when every predicate was skipped.
pub fn when<I, E>(predicates: I) -> Result<When>
where
    I: IntoIterator<Item = E>,
    E: Into<Option<Expr>>,
{
    CaseWhen::default().when(predicates)
}

#[must_use]
pub const fn current_timestamp() -> Expr {
    Expr::CurrentTimestamp
}

#[must_use]
pub const fn random() -> Expr {
    Expr::Random
}

/// `COMMIT`, or nothing when the database runs in autocommit mode.
#[must_use]
pub const fn commit() -> Statement {
    Statement::Commit
}

#[must_use]
pub fn explain(query: impl Into<Table>) -> Explain {
    Explain {
        query: query.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rejects_empty_path() {
        assert!(matches!(
            table(Vec::<String>::new(), None),
            Err(Error::EmptyTablePath)
        ));
        assert!(matches!(table(["a", ""], None), Err(Error::EmptyTablePath)));
        assert_eq!(table(["s", "t"], None).unwrap().path.to_string(), "s.t");
    }

    #[test]
    fn test_and_single_returns_itself() {
        let e = Expr::from(1).gt(0);
        assert_eq!(and_([e.clone()]).unwrap(), e);
        assert!(matches!(
            or_([e.clone(), e]).unwrap(),
            Expr::BinOp(b) if b.op == BinaryOp::Or && b.args.len() == 2
        ));
        assert!(matches!(and_([None::<Expr>]), Err(Error::Builder(_))));
    }

    #[test]
    fn test_if_without_else() {
        let case = if_(true, 1, None::<Expr>).unwrap();
        assert_eq!(case.cases.len(), 1);
        assert!(case.else_expr.is_none());
    }

    #[test]
    fn test_functions() {
        assert!(matches!(sum_(1), Expr::Func(f) if f.name == "sum"));
        assert!(matches!(coalesce([1, 2]), Expr::Func(f) if f.name == "COALESCE" && f.args.len() == 2));
    }
}
