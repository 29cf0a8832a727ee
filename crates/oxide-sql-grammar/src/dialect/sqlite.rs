//! SQLite dialect.

use super::{json_path, Dialect, DmlJoinStrategy, InsertIgnoreStyle, TruncateStyle, UpsertStyle};
use crate::ast::{DatePart, JsonSegment};
use crate::plan::Lock;

/// SQLite.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn unbounded_limit(&self) -> Option<&'static str> {
        Some("-1")
    }

    fn dml_join_strategy(&self) -> DmlJoinStrategy {
        DmlJoinStrategy::RowIdRewrite { column: "rowid" }
    }

    fn rewrites_delete_without_joins(&self) -> bool {
        true
    }

    // ORDER BY inside a compound SELECT member is rejected.
    fn wraps_union_branches(&self) -> bool {
        true
    }

    // Locking is database-wide.
    fn lock_sql(&self, _lock: &Lock) -> Option<String> {
        None
    }

    fn insert_ignore_style(&self) -> InsertIgnoreStyle {
        InsertIgnoreStyle::Prefix("INSERT OR IGNORE INTO")
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnConflict
    }

    fn truncate_style(&self) -> TruncateStyle {
        TruncateStyle::SequenceReset {
            sequence_table: "sqlite_sequence",
        }
    }

    fn date_function(&self, part: DatePart, operand: &str) -> String {
        let format = match part {
            DatePart::Date => "%Y-%m-%d",
            DatePart::Time => "%H:%M:%S",
            DatePart::Day => "%d",
            DatePart::Month => "%m",
            DatePart::Year => "%Y",
        };
        format!("strftime('{format}', {operand})")
    }

    // strftime returns zero-padded text.
    fn date_value(&self, part: DatePart, value: &str) -> String {
        match part {
            DatePart::Day | DatePart::Month => format!("printf('%02d', {value})"),
            DatePart::Date | DatePart::Time | DatePart::Year => format!("cast({value} as text)"),
        }
    }

    fn json_selector(&self, column: &str, path: &[JsonSegment]) -> String {
        format!("json_extract({column}, {})", json_path(path))
    }

    fn json_length(&self, column: &str, path: &[JsonSegment]) -> String {
        if path.is_empty() {
            format!("json_array_length({column})")
        } else {
            format!("json_array_length({column}, {})", json_path(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_dates() {
        let dialect = SqliteDialect::new();
        assert_eq!(
            dialect.date_function(DatePart::Month, "\"at\""),
            "strftime('%m', \"at\")"
        );
        assert_eq!(dialect.date_value(DatePart::Year, "?"), "cast(? as text)");
        assert_eq!(dialect.date_value(DatePart::Day, "?"), "printf('%02d', ?)");
    }

    #[test]
    fn test_sqlite_capabilities() {
        let dialect = SqliteDialect::new();
        assert!(dialect.rewrites_delete_without_joins());
        assert!(dialect.wraps_union_branches());
        assert_eq!(dialect.lock_sql(&Lock::Update), None);
        assert_eq!(dialect.like_operator(true), None);
        assert_eq!(dialect.unbounded_limit(), Some("-1"));
    }

    #[test]
    fn test_sqlite_json() {
        let dialect = SqliteDialect::new();
        let path = [JsonSegment::Key(String::from("tags"))];
        assert_eq!(
            dialect.json_selector("\"meta\"", &path),
            "json_extract(\"meta\", '$.\"tags\"')"
        );
        assert_eq!(
            dialect.json_length("\"meta\"", &path),
            "json_array_length(\"meta\", '$.\"tags\"')"
        );
    }
}
