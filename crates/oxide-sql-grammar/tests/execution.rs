//! Emitted SQL executed against an in-memory engine.

mod common;
use common::*;

use oxide_sql_grammar::ast::ComparisonOperator;
use oxide_sql_grammar::{
    DialectKind, Filterable, Grammar, JoinClause, JoinType, PostgresDialect, Query, Row,
    SqliteDialect,
};

fn published_authors() -> Query {
    Query::table("users")
        .join_clause(
            JoinClause::new(JoinType::Inner, "posts")
                .on("posts.user_id", ComparisonOperator::Eq, "users.id")
                .where_value("posts.status", ComparisonOperator::Eq, "published"),
        )
        .where_eq("users.active", true)
}

fn expected_ids(conn: &duckdb::Connection, query: &Query) -> Vec<i64> {
    let dialect = PostgresDialect::new();
    let grammar = Grammar::new(&dialect);
    ids(conn, &grammar.compile_select(&query.clone().select(&["users.id"])).unwrap())
}

fn flagged_ids(conn: &duckdb::Connection) -> Vec<i64> {
    let flagged = Grammar::new(&PostgresDialect::new())
        .compile_select(&Query::table("users").select(&["id"]).where_eq("flagged", 1))
        .unwrap();
    ids(conn, &flagged)
}

fn remaining_after(deleted: &[i64]) -> Vec<i64> {
    [1, 2, 3, 4]
        .into_iter()
        .filter(|id| !deleted.contains(id))
        .collect()
}

#[test]
fn rowid_update_touches_the_joined_rows() {
    let conn = fixture();
    let query = published_authors();
    let expected = expected_ids(&conn, &query);
    assert_eq!(expected, vec![2, 4]);

    let update = Grammar::new(&SqliteDialect::new())
        .compile_update(&query, &Row::new().set("flagged", 1))
        .unwrap();
    assert!(update.sql.contains("\"users\".\"rowid\" IN (SELECT \"users\".\"rowid\""));
    assert_eq!(execute(&conn, &update), expected.len());
    assert_eq!(flagged_ids(&conn), expected);
}

#[test]
fn rowid_delete_removes_the_joined_rows() {
    let conn = fixture();
    let query = published_authors();
    let expected = expected_ids(&conn, &query);

    let delete = Grammar::new(&SqliteDialect::new()).compile_delete(&query).unwrap();
    assert!(delete.sql.starts_with("DELETE FROM \"users\" WHERE \"users\".\"rowid\" IN (SELECT"));
    assert_eq!(execute(&conn, &delete), expected.len());
    assert_eq!(user_ids(&conn), remaining_after(&expected));
}

#[test]
fn rowid_delete_without_joins_matches_plain_filter() {
    let conn = fixture();
    let query = Query::table("users").where_eq("active", false);
    let delete = Grammar::new(&SqliteDialect::new()).compile_delete(&query).unwrap();
    assert!(delete.sql.contains("\"rowid\" IN (SELECT"));
    assert_eq!(execute(&conn, &delete), 1);
    assert_eq!(user_ids(&conn), vec![1, 2, 4]);
}

#[test]
fn key_rewrite_update_and_delete_follow_joins() {
    let conn = fixture();
    let query = published_authors();
    let expected = expected_ids(&conn, &query);
    let grammar = Grammar::new(&CtidStandIn);

    let update = grammar
        .compile_update(&query, &Row::new().set("flagged", 1))
        .unwrap();
    assert_eq!(execute(&conn, &update), expected.len());
    assert_eq!(flagged_ids(&conn), expected);

    let delete = grammar.compile_delete(&query).unwrap();
    assert_eq!(execute(&conn, &delete), expected.len());
    assert_eq!(user_ids(&conn), remaining_after(&expected));
}

#[test]
fn rowid_delete_respects_order_and_limit() {
    let conn = fixture();
    let delete = Grammar::new(&SqliteDialect::new())
        .compile_delete(&Query::table("users").where_eq("users.active", true).order_by_desc("users.id").limit(2))
        .unwrap();
    assert!(delete.sql.contains("IN (SELECT"));
    assert_eq!(execute(&conn, &delete), 2);
    assert_eq!(user_ids(&conn), vec![1, 3]);
}

#[test]
fn rowid_delete_respects_offset() {
    let conn = fixture();
    let query = Query::table("users")
        .where_eq("active", true)
        .order_by("id")
        .limit(2)
        .offset(1);
    let expected = ids(&conn, &select(DialectKind::Postgres, &query.clone().select(&["id"])));
    assert_eq!(expected, vec![2, 4]);

    let delete = Grammar::new(&SqliteDialect::new()).compile_delete(&query).unwrap();
    assert!(delete.sql.ends_with("ORDER BY \"id\" ASC LIMIT 2 OFFSET 1)"));
    assert_eq!(execute(&conn, &delete), 2);
    assert_eq!(user_ids(&conn), remaining_after(&expected));
}

#[test]
fn key_rewrite_update_respects_offset_without_limit() {
    let conn = fixture();
    let query = Query::table("users").order_by("id").offset(3);
    let update = Grammar::new(&CtidStandIn)
        .compile_update(&query, &Row::new().set("flagged", 1))
        .unwrap();
    assert!(update.sql.ends_with("ORDER BY \"id\" ASC OFFSET 3)"));
    assert_eq!(execute(&conn, &update), 1);
    assert_eq!(flagged_ids(&conn), vec![4]);
}

#[test]
fn wrapped_and_parenthesized_unions_agree() {
    let conn = fixture();
    let query = Query::table("users")
        .select(&["id"])
        .where_eq("active", false)
        .union(Query::table("posts").select(&["user_id"]).where_eq("status", "published"))
        .union_all(Query::table("users").select(&["id"]).where_eq("name", "ann"));

    let parenthesized = select(DialectKind::Postgres, &query);
    let wrapped = select(DialectKind::Sqlite, &query);
    assert!(wrapped.sql.contains("AS \"temp_table\""));
    assert_eq!(ids(&conn, &parenthesized), vec![1, 2, 3, 4]);
    assert_eq!(ids(&conn, &wrapped), ids(&conn, &parenthesized));
}

#[test]
fn ordered_union_branches_agree_when_wrapped() {
    let conn = fixture();
    let query = Query::table("users")
        .select(&["id"])
        .where_eq("active", true)
        .order_by_desc("id")
        .limit(2)
        .union(Query::table("users").select(&["id"]).order_by("id").limit(1));

    let parenthesized = select(DialectKind::Postgres, &query);
    let wrapped = select(DialectKind::Sqlite, &query);
    assert!(wrapped.sql.starts_with("SELECT * FROM (SELECT"));
    assert_eq!(ids(&conn, &parenthesized), vec![1, 2, 4]);
    assert_eq!(ids(&conn, &wrapped), ids(&conn, &parenthesized));
}

#[test]
fn empty_in_lists_match_nothing_or_everything() {
    let conn = fixture();
    let empty: Vec<i64> = Vec::new();
    let none = Query::table("users").select(&["id"]).where_in("id", empty.clone());
    let all = Query::table("users").select(&["id"]).where_not_in("id", empty);

    for kind in DialectKind::all() {
        let never = select(kind, &none);
        let always = select(kind, &all);
        assert!(never.sql.ends_with(" WHERE 0 = 1"), "{kind}: {}", never.sql);
        assert!(always.sql.ends_with(" WHERE 1 = 1"), "{kind}: {}", always.sql);
        assert!(never.bindings.is_empty() && always.bindings.is_empty());
    }

    for kind in [DialectKind::Postgres, DialectKind::Sqlite] {
        assert!(ids(&conn, &select(kind, &none)).is_empty());
        assert_eq!(ids(&conn, &select(kind, &all)), user_ids(&conn));
    }
}

#[test]
fn grouped_or_conditions_evaluate_as_written() {
    let conn = fixture();
    let query = Query::table("users")
        .select(&["id"])
        .where_eq("active", true)
        .where_nested(|q| q.where_eq("name", "ann").or_where_eq("name", "dee"))
        .or_where_eq("id", 3);
    let compiled = select(DialectKind::Sqlite, &query);
    assert_eq!(
        compiled.sql,
        "SELECT \"id\" FROM \"users\" WHERE \"active\" = ? AND (\"name\" = ? OR \"name\" = ?) OR \"id\" = ?"
    );
    assert_eq!(ids(&conn, &compiled), vec![1, 3, 4]);
}

#[test]
fn sqlite_insert_runs_with_bindings() {
    let conn = fixture();
    let dialect = SqliteDialect::new();
    let grammar = Grammar::new(&dialect);
    let rows = [
        Row::new().set("id", 5).set("name", "eve").set("active", true),
        Row::new().set("id", 6).set("name", "fay").set("active", false),
    ];
    let insert = grammar
        .compile_insert(&Query::table("users"), &rows, oxide_sql_grammar::InsertMode::Into)
        .unwrap();
    assert_eq!(execute(&conn, &insert), 2);
    assert_eq!(user_ids(&conn), vec![1, 2, 3, 4, 5, 6]);
}
