//! SQL Server dialect.

use super::{
    json_path, Dialect, DmlJoinStrategy, ExistsStyle, InsertIdStyle, LockPlacement, Pagination,
    UpsertStyle,
};
use crate::ast::{DatePart, JsonSegment};
use crate::plan::Lock;

/// Microsoft SQL Server.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('[', ']')
    }

    fn pagination(&self) -> Pagination {
        Pagination::Top
    }

    fn dml_join_strategy(&self) -> DmlJoinStrategy {
        DmlJoinStrategy::UpdateFrom
    }

    fn wraps_union_branches(&self) -> bool {
        true
    }

    fn lock_placement(&self) -> LockPlacement {
        LockPlacement::TableHint
    }

    fn lock_sql(&self, lock: &Lock) -> Option<String> {
        match lock {
            Lock::Update => Some(String::from("WITH(ROWLOCK,UPDLOCK,HOLDLOCK)")),
            Lock::Shared => Some(String::from("WITH(ROWLOCK,HOLDLOCK)")),
            Lock::Raw(sql) => Some(sql.clone()),
        }
    }

    fn insert_id_style(&self) -> InsertIdStyle {
        InsertIdStyle::ScopeIdentity
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::Merge
    }

    fn exists_style(&self) -> ExistsStyle {
        ExistsStyle::TopOne
    }

    fn date_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S%.3f"
    }

    fn date_function(&self, part: DatePart, operand: &str) -> String {
        match part {
            DatePart::Date | DatePart::Time => format!("cast({operand} as {})", part.as_str()),
            DatePart::Day | DatePart::Month | DatePart::Year => {
                format!("{}({operand})", part.as_str())
            }
        }
    }

    fn json_selector(&self, column: &str, path: &[JsonSegment]) -> String {
        format!("json_value({column}, {})", json_path(path))
    }

    fn json_length(&self, column: &str, path: &[JsonSegment]) -> String {
        format!(
            "(select count(*) from openjson({column}, {}))",
            json_path(path)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlserver_quoting() {
        let dialect = SqlServerDialect::new();
        assert_eq!(dialect.quote_identifier("users"), "[users]");
        assert_eq!(dialect.quote_identifier("a]b"), "[a]]b]");
    }

    #[test]
    fn test_sqlserver_functions() {
        let dialect = SqlServerDialect::new();
        assert_eq!(
            dialect.date_function(DatePart::Time, "[at]"),
            "cast([at] as time)"
        );
        let path = [JsonSegment::Key(String::from("tags"))];
        assert_eq!(
            dialect.json_length("[meta]", &path),
            "(select count(*) from openjson([meta], '$.\"tags\"'))"
        );
        assert_eq!(dialect.date_format(), "%Y-%m-%d %H:%M:%S%.3f");
    }

    #[test]
    fn test_sqlserver_locks_are_table_hints() {
        let dialect = SqlServerDialect::new();
        assert_eq!(dialect.lock_placement(), LockPlacement::TableHint);
        assert_eq!(
            dialect.lock_sql(&Lock::Update).as_deref(),
            Some("WITH(ROWLOCK,UPDLOCK,HOLDLOCK)")
        );
    }
}
