#![allow(dead_code)]

use duckdb::types::Value;
use duckdb::{params_from_iter, Connection};
use oxide_sql_grammar::dialect::{Dialect, DmlJoinStrategy};
use oxide_sql_grammar::grammar::count_placeholders;
use oxide_sql_grammar::{CompiledQuery, DialectKind, Grammar, Query, SqlValue};

/// Compiles `query` for `kind`, panicking on error.
pub fn select(kind: DialectKind, query: &Query) -> CompiledQuery {
    Grammar::new(kind.dialect())
        .compile_select(query)
        .unwrap_or_else(|e| panic!("Failed to compile for {kind}: {e}"))
}

/// Asserts one binding per placeholder.
pub fn assert_parity(kind: DialectKind, compiled: &CompiledQuery) {
    assert_eq!(
        count_placeholders(&compiled.sql, "?"),
        compiled.bindings.len(),
        "Placeholder/binding mismatch for {kind}:\n  {}",
        compiled.sql
    );
}

/// PostgreSQL's DML routing with an integer key standing in for `ctid`,
/// which the fixture engine does not have.
#[derive(Debug)]
pub struct CtidStandIn;

impl Dialect for CtidStandIn {
    fn name(&self) -> &'static str {
        "ctid-stand-in"
    }

    fn dml_join_strategy(&self) -> DmlJoinStrategy {
        DmlJoinStrategy::RowIdRewrite { column: "id" }
    }
}

/// An in-memory database with `users` and `posts`.
///
/// users: 1 ann (active), 2 bob (active), 3 cy (inactive), 4 dee (active)
/// posts: bob and dee have published posts, cy has a draft.
pub fn fixture() -> Connection {
    let conn = Connection::open_in_memory().expect("open duckdb");
    conn.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR, active BOOLEAN, flagged INTEGER DEFAULT 0);
         CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER, status VARCHAR);
         INSERT INTO users VALUES (1, 'ann', true, 0), (2, 'bob', true, 0), (3, 'cy', false, 0), (4, 'dee', true, 0);
         INSERT INTO posts VALUES (10, 2, 'published'), (11, 3, 'draft'), (12, 4, 'published');",
    )
    .expect("create fixture");
    conn
}

pub fn to_duckdb(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Boolean(*b),
        SqlValue::Int(i) => Value::BigInt(*i),
        SqlValue::Float(f) => Value::Double(*f),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Blob(b) => Value::Blob(b.clone()),
        SqlValue::Date(d) => Value::Text(d.to_string()),
        SqlValue::Time(t) => Value::Text(t.to_string()),
        SqlValue::Timestamp(ts) => Value::Text(ts.to_string()),
    }
}

/// Runs a statement and returns the affected row count.
pub fn execute(conn: &Connection, compiled: &CompiledQuery) -> usize {
    let params: Vec<Value> = compiled.values().iter().map(to_duckdb).collect();
    conn.execute(&compiled.sql, params_from_iter(params))
        .unwrap_or_else(|e| panic!("Failed to execute: {}\nError: {e}", compiled.sql))
}

/// Runs a query whose first column is an integer and returns it sorted.
pub fn ids(conn: &Connection, compiled: &CompiledQuery) -> Vec<i64> {
    let params: Vec<Value> = compiled.values().iter().map(to_duckdb).collect();
    let mut stmt = conn
        .prepare(&compiled.sql)
        .unwrap_or_else(|e| panic!("Failed to prepare: {}\nError: {e}", compiled.sql));
    let mut out: Vec<i64> = stmt
        .query_map(params_from_iter(params), |row| row.get::<_, i64>(0))
        .expect("query")
        .map(|r| r.expect("row"))
        .collect();
    out.sort_unstable();
    out
}

/// Ids of every user, sorted.
pub fn user_ids(conn: &Connection) -> Vec<i64> {
    let mut stmt = conn.prepare("SELECT id FROM users ORDER BY id").expect("prepare");
    stmt.query_map([], |row| row.get::<_, i64>(0))
        .expect("query")
        .map(|r| r.expect("row"))
        .collect()
}
