//! PostgreSQL dialect.

use super::{Dialect, DmlJoinStrategy, InsertIdStyle, InsertIgnoreStyle, TruncateStyle, UpsertStyle};
use crate::ast::{DatePart, JsonSegment};
use crate::plan::Lock;

/// PostgreSQL.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// `"col"->'a'->0`, with the last step written as `->>` when `as_text`.
fn json_arrows(column: &str, path: &[JsonSegment], as_text: bool) -> String {
    let mut out = String::from(column);
    for (i, segment) in path.iter().enumerate() {
        let arrow = if as_text && i + 1 == path.len() {
            "->>"
        } else {
            "->"
        };
        out.push_str(arrow);
        match segment {
            JsonSegment::Key(key) => {
                out.push('\'');
                out.push_str(&key.replace('\'', "''"));
                out.push('\'');
            }
            JsonSegment::Index(index) => out.push_str(&index.to_string()),
        }
    }
    out
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn dml_join_strategy(&self) -> DmlJoinStrategy {
        DmlJoinStrategy::RowIdRewrite { column: "ctid" }
    }

    fn lock_sql(&self, lock: &Lock) -> Option<String> {
        match lock {
            Lock::Update => Some(String::from("FOR UPDATE")),
            Lock::Shared => Some(String::from("FOR SHARE")),
            Lock::Raw(sql) => Some(sql.clone()),
        }
    }

    fn insert_ignore_style(&self) -> InsertIgnoreStyle {
        InsertIgnoreStyle::OnConflictDoNothing
    }

    fn insert_id_style(&self) -> InsertIdStyle {
        InsertIdStyle::Returning
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnConflict
    }

    fn truncate_style(&self) -> TruncateStyle {
        TruncateStyle::RestartIdentity
    }

    fn date_function(&self, part: DatePart, operand: &str) -> String {
        match part {
            DatePart::Date | DatePart::Time => format!("{operand}::{}", part.as_str()),
            DatePart::Day | DatePart::Month | DatePart::Year => {
                format!("extract({} from {operand})", part.as_str())
            }
        }
    }

    fn json_selector(&self, column: &str, path: &[JsonSegment]) -> String {
        json_arrows(column, path, true)
    }

    fn json_length(&self, column: &str, path: &[JsonSegment]) -> String {
        format!(
            "json_array_length(({})::json)",
            json_arrows(column, path, false)
        )
    }

    fn like_operator(&self, case_sensitive: bool) -> Option<&'static str> {
        Some(if case_sensitive { "LIKE" } else { "ILIKE" })
    }

    fn like_operand(&self, operand: String) -> String {
        format!("{operand}::text")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> Vec<JsonSegment> {
        vec![JsonSegment::Key(String::from("a")), JsonSegment::Index(0)]
    }

    #[test]
    fn test_postgres_json() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.json_selector("\"meta\"", &path()), "\"meta\"->'a'->>0");
        assert_eq!(
            dialect.json_length("\"meta\"", &path()[..1]),
            "json_array_length((\"meta\"->'a')::json)"
        );
    }

    #[test]
    fn test_postgres_dates_and_like() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.date_function(DatePart::Date, "\"at\""), "\"at\"::date");
        assert_eq!(
            dialect.date_function(DatePart::Year, "\"at\""),
            "extract(year from \"at\")"
        );
        assert_eq!(dialect.like_operator(false), Some("ILIKE"));
        assert_eq!(dialect.like_operand(String::from("\"name\"")), "\"name\"::text");
    }

    #[test]
    fn test_postgres_locks() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.lock_sql(&Lock::Shared).as_deref(), Some("FOR SHARE"));
        assert_eq!(
            dialect.dml_join_strategy(),
            DmlJoinStrategy::RowIdRewrite { column: "ctid" }
        );
    }
}
