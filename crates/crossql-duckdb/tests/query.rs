//! End-to-end tests against an in-memory DuckDB.

mod common;
use common::*;

use chrono::NaiveDate;
use crossql_core::ast::{Fractional, Temporal};
use crossql_core::builder::{
    commit, cte, explain, insert_rows_in_batches, join, table, this, when, DEFAULT_BATCH_SIZE,
    Relation,
};
use crossql_core::{Database, Error, Expr, Row, Schema, SemanticType, Value};

// ===================================================================
// Queries
// ===================================================================

#[test]
fn filter_order_and_project() {
    let db = seeded();
    let q = users()
        .where_([this("id").gt(1)])
        .unwrap()
        .order_by([this("id")])
        .unwrap()
        .select([this("id"), this("name")])
        .unwrap();
    let rows = db.query(q.into()).unwrap();
    assert_eq!(
        rows,
        vec![
            vec![Value::Int(2), Value::from("bob")],
            vec![Value::Int(3), Value::Null],
        ]
    );
}

#[test]
fn count_rows() {
    let db = seeded();
    let rows = db.query(users().count().into()).unwrap();
    assert_eq!(single(&rows), &Value::Int(3));
}

#[test]
fn aggregate_without_keys() {
    let db = seeded();
    let g = users()
        .group_by(Vec::<Expr>::new(), [this("id").sum().alias("total")])
        .unwrap();
    let rows = db.query(g.into()).unwrap();
    assert_eq!(single(&rows), &Value::Int(6));
}

#[test]
fn self_join() {
    let db = seeded();
    let t = users();
    let a = t.alias("a");
    let b = t.alias("b");
    let q = join([a.to_table(), b.to_table()])
        .on([a.col("id").unwrap().eq(b.col("id").unwrap())])
        .unwrap()
        .select([a.col("id").unwrap(), b.col("name").unwrap()])
        .unwrap();
    let rows = db.query(q.into()).unwrap();
    assert_eq!(rows.len(), 3);
}

#[test]
fn cte_query() {
    let db = seeded();
    let big = cte(users().where_([this("id").gt(1)]).unwrap(), Some("big"), None);
    let rows = db.query(big.count().into()).unwrap();
    assert_eq!(single(&rows), &Value::Int(2));
}

#[test]
fn case_expression() {
    let db = seeded();
    let kind = when([this("id").gt(1)])
        .unwrap()
        .then("many")
        .unwrap()
        .else_("one")
        .unwrap();
    let q = users()
        .order_by([this("id")])
        .unwrap()
        .select([Expr::from(kind).alias("kind")])
        .unwrap();
    let rows = db.query(q.into()).unwrap();
    let kinds: Vec<Value> = rows.into_iter().flatten().collect();
    assert_eq!(
        kinds,
        vec![Value::from("one"), Value::from("many"), Value::from("many")]
    );
}

#[test]
fn union_all_count() {
    let db = seeded();
    let ids = users().select([this("id")]).unwrap();
    let both = ids.union_all(&ids);
    let rows = db.query(both.count().into()).unwrap();
    assert_eq!(single(&rows), &Value::Int(6));
}

#[test]
fn explain_returns_plan() {
    let db = seeded();
    let rows = db.query(explain(users()).into()).unwrap();
    assert!(!rows.is_empty());
}

// ===================================================================
// Statements
// ===================================================================

#[test]
fn commit_is_skipped() {
    let db = db();
    assert!(db.query(commit().into()).unwrap().is_empty());
}

#[test]
fn create_as_and_truncate() {
    let db = seeded();
    let copy = table(["users_copy"], None).unwrap();
    db.query(copy.create_as(users()).into()).unwrap();
    assert_eq!(single(&db.query(copy.count().into()).unwrap()), &Value::Int(3));

    db.query(copy.truncate().into()).unwrap();
    assert_eq!(single(&db.query(copy.count().into()).unwrap()), &Value::Int(0));
}

#[test]
fn dropped_table_fails_to_query() {
    let db = seeded();
    db.query(users().drop().into()).unwrap();
    let err = db.query(users().count().into()).unwrap_err();
    assert!(matches!(err, Error::Execution { sql, .. } if sql.contains("\"users\"")));
    db.query(users().drop().if_exists().into()).unwrap();
}

#[test]
fn batched_insert() {
    let db = db();
    let schema = Schema::case_sensitive().with_column("n", SemanticType::Integer);
    let nums = table(["nums"], Some(schema)).unwrap();
    db.query(nums.create().unwrap().into()).unwrap();

    let rows: Vec<Row> = (0..20_000_i64).map(|i| vec![Value::from(i)]).collect();
    insert_rows_in_batches(&db, &nums, rows, None, DEFAULT_BATCH_SIZE).unwrap();

    assert_eq!(single(&db.query(nums.count().into()).unwrap()), &Value::Int(20_000));
}

#[test]
fn timestamps_round_trip() {
    let db = db();
    let schema = Schema::case_sensitive().with_column(
        "at",
        SemanticType::Timestamp(Temporal {
            precision: 6,
            rounds: false,
        }),
    );
    let events = table(["events"], Some(schema)).unwrap();
    db.query(events.create().unwrap().into()).unwrap();

    let at = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_micro_opt(3, 4, 5, 123_456)
        .unwrap();
    db.query(events.insert_row([at], None).into()).unwrap();

    let rows = db.query(events.into()).unwrap();
    assert_eq!(single(&rows), &Value::Timestamp(at));
}

// ===================================================================
// Dialect normalization on a live database
// ===================================================================

fn eval(db: &impl Database, expr: &str) -> Value {
    let rows = db.execute(&format!("SELECT {expr}")).unwrap();
    single(&rows).clone()
}

#[test]
fn normalize_values() {
    let db = db();
    let d = db.dialect();

    let number = d.normalize_number("1.5", &Fractional { precision: 3 });
    assert_eq!(eval(&db, &number), Value::from("1.500"));

    let boolean = d.normalize_boolean("true");
    assert_eq!(eval(&db, &boolean), Value::from("1"));

    let ts = d.normalize_timestamp(
        "'2024-01-02 03:04:05.123456'",
        &Temporal {
            precision: 3,
            rounds: false,
        },
    );
    assert_eq!(eval(&db, &ts), Value::from("2024-01-02 03:04:05.123000"));
}
