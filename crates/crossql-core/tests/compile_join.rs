//! Tests for JOIN compilation and column qualification.

mod common;
use common::*;

use crossql_core::builder::{join, leftjoin, outerjoin, table, this, Relation};
use crossql_core::{Error, Expr, Schema, SemanticType, Table};

// ===================================================================
// Generated aliases
// ===================================================================

#[test]
fn join_generates_aliases() {
    let q = join([users(), orders()])
        .on([this("id").eq(this("user_id"))])
        .unwrap()
        .select([this("name"), this("order_id")])
        .unwrap();
    assert_eq!(
        compile(q),
        r#"SELECT "tmp1"."name", "tmp2"."order_id" FROM "users" "tmp1" JOIN "orders" "tmp2" ON ("tmp1"."id" = "tmp2"."user_id")"#
    );
}

#[test]
fn join_kinds() {
    let q = leftjoin([users(), orders()]);
    assert_eq!(
        compile(q),
        r#"SELECT * FROM "users" "tmp1" LEFT JOIN "orders" "tmp2""#
    );
    let q = outerjoin([users(), orders()]);
    assert_eq!(
        compile(q),
        r#"SELECT * FROM "users" "tmp1" FULL OUTER JOIN "orders" "tmp2""#
    );
}

#[test]
fn where_on_join_nests_it() {
    let q = users()
        .join(&orders())
        .on([this("id").eq(this("user_id"))])
        .unwrap()
        .where_([this("name").eq("x")])
        .unwrap();
    assert_eq!(
        compile(q),
        r#"SELECT * FROM (SELECT * FROM "users" "tmp1" JOIN "orders" "tmp2" ON ("tmp1"."id" = "tmp2"."user_id")) tmp3 WHERE ("name" = 'x')"#
    );
}

#[test]
fn join_placeholder_must_be_unique() {
    let err = join([users(), users()])
        .on([this("id").eq(1)])
        .unwrap_err();
    assert!(matches!(err, Error::AmbiguousColumn(name) if name == "id"));

    let err = join([users(), orders()]).select([this("missing")]).unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { .. }));
}

#[test]
fn empty_on_is_noop() {
    let j = join([users(), orders()]);
    let same = j.on([None::<Expr>]).unwrap();
    assert_eq!(compile(j), compile(same));
}

// ===================================================================
// Self-joins
// ===================================================================

#[test]
fn self_join_qualifies_alias_columns() {
    let t = users();
    let a = t.alias("a");
    let b = t.alias("b");
    let q = join([a.to_table(), b.to_table()])
        .on([a.col("id").unwrap().eq(b.col("id").unwrap())])
        .unwrap()
        .select([a.col("name").unwrap(), b.col("name").unwrap().alias("other")])
        .unwrap();
    assert_eq!(
        compile(q),
        r#"SELECT "a"."name", "b"."name" AS "other" FROM "users" "a" JOIN "users" "b" ON ("a"."id" = "b"."id")"#
    );
}

#[test]
fn self_join_shared_column_is_ambiguous() {
    let t = users();
    let q = join([t.alias("a").to_table(), t.alias("b").to_table()])
        .select([t.col("id").unwrap()])
        .unwrap();
    let err = compile_err(q);
    assert!(matches!(err, Error::TooManyAliases(_)));
    assert_eq!(err.to_string(), "Too many aliases for column id");
}

// ===================================================================
// Join schema and re-selection
// ===================================================================

#[test]
fn join_schema_requires_columns() {
    let j = join([users(), orders()]);
    assert!(matches!(j.schema(), Err(Error::Builder(_))));

    let Table::Join(fixed) = j.select([this("name")]).unwrap() else {
        panic!("expected a join");
    };
    let schema = fixed.schema().unwrap().unwrap();
    assert_eq!(schema.names().collect::<Vec<_>>(), vec!["name"]);
}

#[test]
fn select_on_fixed_join_adds_layer() {
    let Table::Join(fixed) = join([users(), orders()])
        .select([this("name"), this("order_id")])
        .unwrap()
    else {
        panic!("expected a join");
    };
    let q = fixed.select([this("name")]).unwrap();
    assert_eq!(
        compile(q),
        r#"SELECT "name" FROM (SELECT "tmp1"."name", "tmp2"."order_id" FROM "users" "tmp1" JOIN "orders" "tmp2") tmp3"#
    );
}

// ===================================================================
// Nested joins
// ===================================================================

#[test]
fn nested_join_without_columns_fails_resolution() {
    let inner = Table::from(join([users(), orders()]));
    let outer = join([inner, users().to_table()]);
    let err = outer.on([this("nope").eq(1)]).unwrap_err();
    assert!(matches!(err, Error::Builder(_)));
}

#[test]
fn nested_join_with_columns_resolves_through_it() {
    let schema = Schema::case_sensitive().with_column("sku", SemanticType::Text);
    let items = table(["items"], Some(schema)).unwrap();
    let inner = join([users(), orders()])
        .select([this("name"), this("order_id")])
        .unwrap();
    let outer = join([inner, items.to_table()]);

    assert!(outer.on([this("order_id").eq(this("sku"))]).is_ok());
    let err = outer.on([this("nope").eq(1)]).unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { column, .. } if column == "nope"));
}
