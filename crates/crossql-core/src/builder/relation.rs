//! The builder contract shared by every relation node.

use std::sync::Arc;

use crate::ast::{
    Count, Cte, Expr, GroupBy, Join, JoinKind, Select, SelectParts, SetOp, Table, TableAlias,
    TableOp, TableParam, TablePath,
};
use crate::error::Result;
use crate::schema::Schema;

use super::resolve::{present, resolve_names};

fn non_empty(exprs: Vec<Expr>) -> Option<Vec<Expr>> {
    if exprs.is_empty() {
        None
    } else {
        Some(exprs)
    }
}

/// Query-building methods available on every relation.
///
/// Arguments accept `None` as a skip marker. Placeholders created with
/// [`this`](super::this) are bound against the relation before the result is
/// built.
pub trait Relation {
    /// The relation as a [`Table`] node, keeping its identity.
    fn to_table(&self) -> Table;

    /// A column of this relation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownColumn`](crate::Error::UnknownColumn) when the
    /// schema lacks the column.
    fn col(&self, name: &str) -> Result<Expr> {
        self.to_table().get_column(name).map(Expr::from)
    }

    /// The relation's schema, when known.
    ///
    /// # Errors
    ///
    /// See [`Table::schema`].
    fn schema(&self) -> Result<Option<Schema>> {
        self.to_table().schema()
    }

    /// `SELECT columns FROM self`.
    ///
    /// # Errors
    ///
    /// Fails when a placeholder cannot be bound.
    fn select<I, E>(&self, columns: I) -> Result<Table>
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Expr>>,
    {
        select_with(self.to_table(), present(columns), None)
    }

    /// `SELECT DISTINCT columns FROM self`.
    ///
    /// # Errors
    ///
    /// Fails when a placeholder cannot be bound.
    fn select_distinct<I, E>(&self, columns: I) -> Result<Table>
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Expr>>,
    {
        select_with(self.to_table(), present(columns), Some(true))
    }

    /// `SELECT ALL columns FROM self`. Over a distinct select this nests a
    /// new, non-distinct layer instead of merging.
    ///
    /// # Errors
    ///
    /// Fails when a placeholder cannot be bound.
    fn select_all<I, E>(&self, columns: I) -> Result<Table>
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Expr>>,
    {
        select_with(self.to_table(), present(columns), Some(false))
    }

    /// Filters rows. Predicates accumulate across calls.
    ///
    /// # Errors
    ///
    /// Fails when a placeholder cannot be bound.
    fn where_<I, E>(&self, predicates: I) -> Result<Table>
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Expr>>,
    {
        let table = self.to_table();
        let predicates = present(predicates);
        if predicates.is_empty() {
            return Ok(table);
        }
        resolve_names(table.resolution_source(), &predicates)?;
        Ok(Select::make(
            table,
            SelectParts {
                where_exprs: predicates,
                ..SelectParts::default()
            },
        ))
    }

    /// # Errors
    ///
    /// Fails when a placeholder cannot be bound.
    fn order_by<I, E>(&self, exprs: I) -> Result<Table>
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Expr>>,
    {
        let table = self.to_table();
        let exprs = present(exprs);
        if exprs.is_empty() {
            return Ok(table);
        }
        resolve_names(table.resolution_source(), &exprs)?;
        Ok(Select::make(
            table,
            SelectParts {
                order_by: exprs,
                ..SelectParts::default()
            },
        ))
    }

    fn limit(&self, limit: u64) -> Table {
        Select::make(
            self.to_table(),
            SelectParts {
                limit: Some(limit),
                ..SelectParts::default()
            },
        )
    }

    /// Inner join with `other`.
    fn join(&self, other: &impl Relation) -> Join {
        Join::new(vec![self.to_table(), other.to_table()], JoinKind::Inner)
    }

    /// Groups by `keys`, computing `values` per group.
    ///
    /// # Errors
    ///
    /// Fails when both lists are empty or a placeholder cannot be bound.
    fn group_by<K, KE, V, VE>(&self, keys: K, values: V) -> Result<GroupBy>
    where
        K: IntoIterator<Item = KE>,
        KE: Into<Option<Expr>>,
        V: IntoIterator<Item = VE>,
        VE: Into<Option<Expr>>,
    {
        let table = self.to_table();
        let keys = present(keys);
        let values = present(values);
        let all: Vec<Expr> = keys.iter().chain(&values).cloned().collect();
        resolve_names(table.resolution_source(), &all)?;
        GroupBy::new(table, keys, values)
    }

    fn union(&self, other: &impl Relation) -> TableOp {
        TableOp::new(SetOp::Union, self.to_table(), other.to_table())
    }

    fn union_all(&self, other: &impl Relation) -> TableOp {
        TableOp::new(SetOp::UnionAll, self.to_table(), other.to_table())
    }

    /// `self EXCEPT other`
    fn minus(&self, other: &impl Relation) -> TableOp {
        TableOp::new(SetOp::Except, self.to_table(), other.to_table())
    }

    fn intersect(&self, other: &impl Relation) -> TableOp {
        TableOp::new(SetOp::Intersect, self.to_table(), other.to_table())
    }

    /// `SELECT count(*) FROM self`
    fn count(&self) -> Table {
        let count = Expr::Count(Arc::new(Count {
            expr: None,
            distinct: false,
        }));
        let mut select = Select::new(Some(self.to_table()));
        select.columns = Some(vec![count]);
        select.into()
    }

    fn alias(&self, name: &str) -> TableAlias {
        TableAlias::new(self.to_table(), name)
    }
}

fn select_with(table: Table, columns: Vec<Expr>, distinct: Option<bool>) -> Result<Table> {
    resolve_names(table.resolution_source(), &columns)?;
    Ok(Select::make(
        table,
        SelectParts {
            columns: non_empty(columns),
            distinct,
            ..SelectParts::default()
        },
    ))
}

impl Relation for Table {
    fn to_table(&self) -> Table {
        self.clone()
    }
}

macro_rules! impl_relation {
    ($($node:ident),* $(,)?) => {
        $(
            impl Relation for $node {
                fn to_table(&self) -> Table {
                    Table::from(self.clone())
                }
            }
        )*
    };
}

impl_relation!(TablePath, TableAlias, GroupBy, TableOp, Select, Cte, TableParam);

impl Relation for Join {
    fn to_table(&self) -> Table {
        Table::from(self.clone())
    }

    /// Fixes the join's columns on the first call. Once fixed, further
    /// selects nest a new `SELECT`.
    fn select<I, E>(&self, columns: I) -> Result<Table>
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Expr>>,
    {
        if self.columns.is_some() {
            return self.to_table().select(columns);
        }
        let columns = present(columns);
        resolve_names(&self.to_table(), &columns)?;
        Ok(self.with_columns(columns).into())
    }
}

impl Join {
    /// Adds join predicates. Passing only skipped predicates is a no-op.
    ///
    /// # Errors
    ///
    /// Fails when a placeholder is missing from, or ambiguous among, the
    /// joined relations.
    pub fn on<I, E>(&self, predicates: I) -> Result<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Expr>>,
    {
        let predicates = present(predicates);
        if predicates.is_empty() {
            return Ok(self.clone());
        }
        resolve_names(&self.to_table(), &predicates)?;
        Ok(self.with_on(predicates))
    }
}

impl GroupBy {
    /// Adds `HAVING` predicates, resolved against the grouped relation.
    ///
    /// # Errors
    ///
    /// Fails when a placeholder cannot be bound.
    pub fn having<I, E>(&self, predicates: I) -> Result<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Expr>>,
    {
        let predicates = present(predicates);
        if predicates.is_empty() {
            return Ok(self.clone());
        }
        resolve_names(self.table.resolution_source(), &predicates)?;
        Ok(self.with_having(predicates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SemanticType;
    use crate::builder::{table, this};
    use crate::error::Error;

    fn users() -> TablePath {
        let schema = Schema::case_insensitive()
            .with_column("id", SemanticType::Integer)
            .with_column("name", SemanticType::Text);
        table(["users"], Some(schema)).unwrap()
    }

    #[test]
    fn test_where_merges_into_select() {
        let q = users().where_([this("id").gt(1)]).unwrap();
        let q = q.where_([this("id").lt(10)]).unwrap();
        let Table::Select(s) = q else {
            panic!("expected a select");
        };
        assert_eq!(s.where_exprs.len(), 2);
        assert!(matches!(s.table, Some(Table::Path(_))));
    }

    #[test]
    fn test_skipped_where_is_noop() {
        let t = users();
        let q = t.where_([None::<Expr>]).unwrap();
        assert_eq!(q.id(), t.id());
    }

    #[test]
    fn test_limit_seals_select() {
        let q = users().limit(5).where_([this("id").gt(1)]).unwrap();
        let Table::Select(outer) = q else {
            panic!("expected a select");
        };
        assert!(outer.limit.is_none());
        assert!(matches!(&outer.table, Some(Table::Select(inner)) if inner.limit == Some(5)));
    }

    #[test]
    fn test_select_twice_wraps() {
        let q = users().select([this("id")]).unwrap();
        let q = q.select([this("id")]).unwrap();
        let Table::Select(outer) = q else {
            panic!("expected a select");
        };
        assert!(matches!(outer.table, Some(Table::Select(_))));
    }

    #[test]
    fn test_distinct_survives_merge() {
        let q = users().select_distinct([this("name")]).unwrap();
        let Table::Select(s) = &q else {
            panic!("expected a select");
        };
        assert!(s.distinct);
        let q = q.order_by([this("name")]).unwrap();
        assert!(matches!(&q, Table::Select(s) if s.distinct && s.order_by.len() == 1));
    }

    #[test]
    fn test_select_all_over_distinct_nests() {
        let distinct = users().select_distinct(Vec::<Expr>::new()).unwrap();
        let q = distinct.select_all([this("name")]).unwrap();
        let Table::Select(outer) = &q else {
            panic!("expected a select");
        };
        assert!(!outer.distinct);
        assert!(matches!(&outer.table, Some(Table::Select(inner)) if inner.distinct));
    }

    #[test]
    fn test_select_all_over_plain_select_merges() {
        let q = users().where_([this("id").gt(1)]).unwrap();
        let q = q.select_all([this("name")]).unwrap();
        let Table::Select(s) = &q else {
            panic!("expected a select");
        };
        assert!(!s.distinct);
        assert!(matches!(&s.table, Some(Table::Path(_))));
    }

    #[test]
    fn test_group_by_shares_placeholder_between_keys_and_values() {
        let name = this("name");
        let g = users().group_by([name.clone()], [name.count()]).unwrap();
        assert_eq!(g.keys[0].name(), Some("name"));
    }

    #[test]
    fn test_count_wraps_relation() {
        let q = users().count();
        let Table::Select(s) = &q else {
            panic!("expected a select");
        };
        assert!(matches!(&s.table, Some(Table::Path(_))));
        assert_eq!(s.columns.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_group_by_requires_keys_or_values() {
        let err = users()
            .group_by(Vec::<Expr>::new(), Vec::<Expr>::new())
            .unwrap_err();
        assert!(matches!(err, Error::Builder(_)));
    }

    #[test]
    fn test_join_select_fixes_columns_once() {
        let a = users().alias("a");
        let b = users().alias("b");
        let j = a.join(&b);
        let first = j.select([a.col("id").unwrap()]).unwrap();
        assert!(matches!(&first, Table::Join(j) if j.columns.is_some()));
        let Table::Join(fixed) = first else {
            panic!("expected a join");
        };
        let second = fixed.select([a.col("id").unwrap()]).unwrap();
        assert!(matches!(second, Table::Select(_)));
    }

    #[test]
    fn test_join_on_ambiguous_placeholder() {
        let j = users().alias("a").join(&users().alias("b"));
        assert!(matches!(
            j.on([this("id").eq(1)]),
            Err(Error::AmbiguousColumn(_))
        ));
        assert_eq!(j.on([None::<Expr>]).unwrap().id(), j.id());
    }

    #[test]
    fn test_having_resolves_against_grouped_table() {
        let g = users()
            .group_by([this("name")], [this("id").count().alias("n")])
            .unwrap();
        let g = g.having([this("id").count().gt(1)]).unwrap();
        assert_eq!(g.having.len(), 1);
    }

    #[test]
    fn test_col_on_alias_belongs_to_alias() {
        let a = users().alias("a");
        let Expr::Column(c) = a.col("ID").unwrap() else {
            panic!("expected a column");
        };
        assert_eq!(c.source().id(), a.id());
        assert_eq!(c.name(), "id");
    }
}
