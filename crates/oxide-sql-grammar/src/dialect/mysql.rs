//! MySQL dialect.

use super::{Dialect, InsertIgnoreStyle, UpsertStyle};

/// MySQL and MariaDB.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('`', '`')
    }

    // Largest LIMIT the server accepts.
    fn unbounded_limit(&self) -> Option<&'static str> {
        Some("18446744073709551615")
    }

    fn supports_dml_order_limit(&self) -> bool {
        true
    }

    fn insert_ignore_style(&self) -> InsertIgnoreStyle {
        InsertIgnoreStyle::Prefix("INSERT IGNORE INTO")
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnDuplicateKey
    }

    fn empty_insert_values(&self) -> &'static str {
        "() VALUES ()"
    }

    fn like_operator(&self, case_sensitive: bool) -> Option<&'static str> {
        Some(if case_sensitive { "LIKE BINARY" } else { "LIKE" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DatePart, JsonSegment};
    use crate::dialect::{DmlJoinStrategy, Pagination};

    #[test]
    fn test_mysql_dialect() {
        let dialect = MySqlDialect::new();
        assert_eq!(dialect.name(), "mysql");
        assert_eq!(dialect.quote_identifier("order"), "`order`");
        assert_eq!(dialect.quote_identifier("a`b"), "`a``b`");
        assert_eq!(dialect.pagination(), Pagination::LimitOffset);
        assert_eq!(dialect.dml_join_strategy(), DmlJoinStrategy::Native);
        assert!(dialect.supports_dml_order_limit());
    }

    #[test]
    fn test_mysql_functions() {
        let dialect = MySqlDialect::new();
        assert_eq!(dialect.date_function(DatePart::Day, "`created`"), "day(`created`)");
        let path = [JsonSegment::Key(String::from("tags"))];
        assert_eq!(
            dialect.json_selector("`meta`", &path),
            "json_unquote(json_extract(`meta`, '$.\"tags\"'))"
        );
        assert_eq!(
            dialect.json_length("`meta`", &path),
            "json_length(`meta`, '$.\"tags\"')"
        );
        assert_eq!(dialect.like_operator(true), Some("LIKE BINARY"));
    }
}
