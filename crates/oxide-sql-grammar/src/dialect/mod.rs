//! SQL dialect support.
//!
//! Engines disagree on pagination, multi-table DML, quoting, locking and a
//! handful of function names. A [`Dialect`] describes those differences as
//! capability values plus a few rendering hooks; the grammar and visitor
//! are shared.

mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

use crate::ast::{DatePart, JsonSegment};
use crate::error::GrammarError;
use crate::plan::Lock;

/// How LIMIT/OFFSET are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// `LIMIT n OFFSET m`
    LimitOffset,
    /// `SELECT TOP n …` plus `OFFSET m ROWS`
    Top,
}

/// How UPDATE/DELETE statements with joins are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmlJoinStrategy {
    /// `UPDATE t JOIN … SET …` and `DELETE t FROM t JOIN …`.
    Native,
    /// Single-table statement restricted to `column IN (joined select)`.
    RowIdRewrite {
        /// The engine's physical row identifier.
        column: &'static str,
    },
    /// `UPDATE t SET … FROM t JOIN …` and `DELETE t FROM t JOIN …`.
    UpdateFrom,
}

/// Where a lock is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPlacement {
    /// After the whole statement.
    Suffix,
    /// As a table hint after the FROM table.
    TableHint,
}

/// How INSERT skips colliding rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertIgnoreStyle {
    /// Replaces `INSERT INTO` with the given keywords.
    Prefix(&'static str),
    /// `… ON CONFLICT DO NOTHING`
    OnConflictDoNothing,
    Unsupported,
}

/// How an inserted row's id is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertIdStyle {
    /// The driver reports the id; the insert is unchanged.
    Driver,
    /// `… RETURNING column`
    Returning,
    /// `SET NOCOUNT ON; …; SELECT SCOPE_IDENTITY() AS column`
    ScopeIdentity,
}

/// How INSERT overwrites colliding rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStyle {
    Unsupported,
    /// `ON DUPLICATE KEY UPDATE col = VALUES(col)`
    OnDuplicateKey,
    /// `ON CONFLICT (…) DO UPDATE SET col = "excluded".col`
    OnConflict,
    /// `MERGE … USING (VALUES …)`
    Merge,
}

/// How TRUNCATE is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncateStyle {
    /// `TRUNCATE TABLE t`
    TruncateTable,
    /// `TRUNCATE t RESTART IDENTITY CASCADE`
    RestartIdentity,
    /// Clear the autoincrement counter in `sequence_table`, then `DELETE FROM t`.
    SequenceReset { sequence_table: &'static str },
}

/// How an existence check is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistsStyle {
    /// `SELECT EXISTS (…) AS exists`
    SelectExists,
    /// `SELECT TOP 1 1 AS exists FROM …`
    TopOne,
}

/// Trait for SQL dialect-specific behavior.
///
/// Defaults describe the MySQL-like engine family where one exists.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the opening and closing identifier quote characters.
    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    /// Quotes one identifier segment. `*` is never quoted and a closing
    /// quote inside the name is doubled.
    fn quote_identifier(&self, name: &str) -> String {
        if name == "*" {
            return String::from("*");
        }
        let (open, close) = self.identifier_quotes();
        let mut quoted = String::with_capacity(name.len() + 2);
        quoted.push(open);
        for c in name.chars() {
            if c == close {
                quoted.push(close);
            }
            quoted.push(c);
        }
        quoted.push(close);
        quoted
    }

    /// Returns the parameter placeholder.
    fn parameter_placeholder(&self) -> &'static str {
        "?"
    }

    /// Returns the pagination strategy.
    fn pagination(&self) -> Pagination {
        Pagination::LimitOffset
    }

    /// The LIMIT written when only an offset is requested, if the engine
    /// needs one.
    fn unbounded_limit(&self) -> Option<&'static str> {
        None
    }

    /// Returns the UPDATE/DELETE join strategy.
    fn dml_join_strategy(&self) -> DmlJoinStrategy {
        DmlJoinStrategy::Native
    }

    /// Whether DELETE goes through the row-id rewrite even without joins
    /// or limit.
    fn rewrites_delete_without_joins(&self) -> bool {
        false
    }

    /// Whether single-table UPDATE/DELETE accept ORDER BY and LIMIT.
    fn supports_dml_order_limit(&self) -> bool {
        false
    }

    /// Whether each UNION branch is wrapped as `SELECT * FROM (…) AS temp`.
    fn wraps_union_branches(&self) -> bool {
        false
    }

    /// Returns where lock clauses go.
    fn lock_placement(&self) -> LockPlacement {
        LockPlacement::Suffix
    }

    /// Returns the lock clause text, or `None` when the engine has no
    /// row locks.
    fn lock_sql(&self, lock: &Lock) -> Option<String> {
        match lock {
            Lock::Update => Some(String::from("FOR UPDATE")),
            Lock::Shared => Some(String::from("LOCK IN SHARE MODE")),
            Lock::Raw(sql) => Some(sql.clone()),
        }
    }

    /// Returns the insert-or-ignore style.
    fn insert_ignore_style(&self) -> InsertIgnoreStyle {
        InsertIgnoreStyle::Unsupported
    }

    /// Returns the insert-get-id style.
    fn insert_id_style(&self) -> InsertIdStyle {
        InsertIdStyle::Driver
    }

    /// Returns the upsert style.
    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::Unsupported
    }

    /// Returns the TRUNCATE style.
    fn truncate_style(&self) -> TruncateStyle {
        TruncateStyle::TruncateTable
    }

    /// Returns the existence-check style.
    fn exists_style(&self) -> ExistsStyle {
        ExistsStyle::SelectExists
    }

    /// The row list of an INSERT without columns.
    fn empty_insert_values(&self) -> &'static str {
        "DEFAULT VALUES"
    }

    /// Returns the chrono format used for stored timestamps.
    fn date_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S"
    }

    /// Extracts a calendar part from an already rendered operand.
    fn date_function(&self, part: DatePart, operand: &str) -> String {
        format!("{}({operand})", part.as_str())
    }

    /// Wraps the value compared against [`Dialect::date_function`].
    fn date_value(&self, _part: DatePart, value: &str) -> String {
        String::from(value)
    }

    /// Renders a JSON selector as a scalar.
    fn json_selector(&self, column: &str, path: &[JsonSegment]) -> String {
        format!("json_unquote(json_extract({column}, {}))", json_path(path))
    }

    /// Renders the length of the JSON array at `path`.
    fn json_length(&self, column: &str, path: &[JsonSegment]) -> String {
        if path.is_empty() {
            format!("json_length({column})")
        } else {
            format!("json_length({column}, {})", json_path(path))
        }
    }

    /// Returns the LIKE keyword, or `None` when the requested case handling
    /// has no syntax.
    fn like_operator(&self, case_sensitive: bool) -> Option<&'static str> {
        if case_sensitive {
            None
        } else {
            Some("LIKE")
        }
    }

    /// Adjusts the left operand of LIKE.
    fn like_operand(&self, operand: String) -> String {
        operand
    }
}

/// Renders `'$."key"[0]'` for engines that take a JSON path string.
#[must_use]
pub fn json_path(path: &[JsonSegment]) -> String {
    let mut out = String::from("'$");
    for segment in path {
        match segment {
            JsonSegment::Key(key) => {
                out.push_str(".\"");
                for c in key.chars() {
                    match c {
                        '\'' => out.push_str("''"),
                        '"' => out.push_str("\\\""),
                        c => out.push(c),
                    }
                }
                out.push('"');
            }
            JsonSegment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out.push('\'');
    out
}

static MYSQL: MySqlDialect = MySqlDialect::new();
static POSTGRES: PostgresDialect = PostgresDialect::new();
static SQLITE: SqliteDialect = SqliteDialect::new();
static SQLSERVER: SqlServerDialect = SqlServerDialect::new();

/// A dialect chosen by name, for configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[serde(alias = "mariadb")]
    MySql,
    #[serde(alias = "pgsql", alias = "postgresql")]
    Postgres,
    Sqlite,
    #[serde(alias = "mssql", alias = "sqlsrv")]
    SqlServer,
}

impl DialectKind {
    /// Returns the shared dialect instance.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::MySql => &MYSQL,
            Self::Postgres => &POSTGRES,
            Self::Sqlite => &SQLITE,
            Self::SqlServer => &SQLSERVER,
        }
    }

    /// Every dialect, in a fixed order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::MySql, Self::Postgres, Self::Sqlite, Self::SqlServer]
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dialect().name())
    }
}

impl FromStr for DialectKind {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgres" | "pgsql" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            "sqlserver" | "mssql" | "sqlsrv" => Ok(Self::SqlServer),
            other => Err(GrammarError::construction(format!(
                "unknown dialect: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_doubles_closing_quote() {
        let dialect = DialectKind::Postgres.dialect();
        assert_eq!(dialect.quote_identifier("users"), "\"users\"");
        assert_eq!(dialect.quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(dialect.quote_identifier("*"), "*");
    }

    #[test]
    fn test_json_path() {
        let path = [
            JsonSegment::Key(String::from("tags")),
            JsonSegment::Index(0),
            JsonSegment::Key(String::from("it's")),
        ];
        assert_eq!(json_path(&path), "'$.\"tags\"[0].\"it''s\"'");
        assert_eq!(json_path(&[]), "'$'");
    }

    #[test]
    fn test_dialect_kind_from_str() {
        assert_eq!("pgsql".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!("MSSQL".parse::<DialectKind>().unwrap(), DialectKind::SqlServer);
        assert!("oracle".parse::<DialectKind>().is_err());
    }

    #[test]
    fn test_dialect_kind_serde_aliases() {
        let kind: DialectKind = serde_json::from_str("\"postgresql\"").unwrap();
        assert_eq!(kind, DialectKind::Postgres);
        let kind: DialectKind = serde_json::from_str("\"sqlserver\"").unwrap();
        assert_eq!(kind, DialectKind::SqlServer);
        assert_eq!(serde_json::to_string(&DialectKind::MySql).unwrap(), "\"mysql\"");
    }

    #[test]
    fn test_display_uses_dialect_name() {
        for kind in DialectKind::all() {
            assert_eq!(kind.to_string(), kind.dialect().name());
        }
    }
}
