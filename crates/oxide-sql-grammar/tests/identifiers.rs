//! Identifier quoting and fragment parsing.

mod common;

use oxide_sql_grammar::fragment::{parse_column, parse_table};
use oxide_sql_grammar::{DialectKind, Grammar, GrammarError, Query};

const NAMES: &[&str] = &["users", "order", "my table", "we\"ird", "back`tick", "br]acket", "ünïcode"];

#[test]
fn quoted_identifiers_parse_back_to_the_same_name() {
    for kind in DialectKind::all() {
        let dialect = kind.dialect();
        for name in NAMES {
            let quoted = dialect.quote_identifier(name);
            let table = parse_table(&quoted)
                .unwrap_or_else(|e| panic!("{kind} produced unparsable `{quoted}`: {e}"));
            assert_eq!(table.path.segments.len(), 1, "{kind}: {quoted}");
            assert_eq!(table.path.segments[0].as_str(), *name, "{kind}: {quoted}");
        }
    }
}

#[test]
fn quoted_paths_parse_back_with_alias() {
    for kind in DialectKind::all() {
        let grammar = Grammar::new(kind.dialect());
        let quoted = grammar.quote_column_name("users.id as uid").unwrap();
        let column = parse_column(&quoted).unwrap();
        let segments: Vec<&str> = column.path.segments.iter().map(|s| s.as_str()).collect();
        assert_eq!(segments, vec!["users", "id"]);
        assert_eq!(column.alias.map(|a| a.as_str().to_owned()).as_deref(), Some("uid"));
    }
}

#[test]
fn wildcards_stay_unquoted() {
    let query = Query::table("users").select(&["users.*"]);
    assert_eq!(
        common::select(DialectKind::SqlServer, &query).sql,
        "SELECT [users].* FROM [users]"
    );
    assert_eq!(
        common::select(DialectKind::MySql, &Query::table("users")).sql,
        "SELECT * FROM `users`"
    );
}

#[test]
fn malformed_fragments_are_rejected() {
    let grammar = Grammar::new(DialectKind::Postgres.dialect());
    for fragment in ["users.", "users as", "\"unterminated", "a b", "users;drop"] {
        assert!(
            matches!(
                grammar.compile_select(&Query::table(fragment)),
                Err(GrammarError::Fragment(_))
            ),
            "`{fragment}` should not parse"
        );
    }
}
