//! Grammar configuration.

use serde::{Deserialize, Serialize};

use crate::dialect::DialectKind;
use crate::error::Result;
use crate::grammar::Grammar;

/// Which dialect to compile for, and the table prefix to apply.
///
/// ```json
/// { "dialect": "pgsql", "table_prefix": "app_" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarConfig {
    /// The target engine, by name or alias.
    pub dialect: DialectKind,
    /// Prepended to table names, table aliases and column qualifiers.
    /// Empty when absent.
    #[serde(default)]
    pub table_prefix: String,
}

impl GrammarConfig {
    /// Creates a configuration without a table prefix.
    #[must_use]
    pub const fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            table_prefix: String::new(),
        }
    }

    /// Sets the table prefix.
    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GrammarError::Config`] when the document is not a
    /// valid configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the configured grammar.
    #[must_use]
    pub fn grammar(&self) -> Grammar<'static> {
        Grammar::from_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GrammarError;

    #[test]
    fn test_from_json_with_alias_and_default_prefix() {
        let config = GrammarConfig::from_json(r#"{"dialect": "mssql"}"#).unwrap();
        assert_eq!(config, GrammarConfig::new(DialectKind::SqlServer));
        assert_eq!(config.grammar().dialect().name(), "sqlserver");
    }

    #[test]
    fn test_from_json_rejects_unknown_dialect() {
        let err = GrammarConfig::from_json(r#"{"dialect": "oracle"}"#).unwrap_err();
        assert!(matches!(err, GrammarError::Config(_)));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = GrammarConfig::new(DialectKind::Postgres).with_table_prefix("app_");
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(GrammarConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_table_prefix_reaches_tables_aliases_and_qualifiers() {
        let config = GrammarConfig::from_json(r#"{"dialect": "pgsql", "table_prefix": "app_"}"#).unwrap();
        let grammar = config.grammar();
        assert_eq!(
            grammar.quote_table_name("users as u").unwrap(),
            "\"app_users\" AS \"app_u\""
        );
        assert_eq!(
            grammar.quote_column_name("u.id as uid").unwrap(),
            "\"app_u\".\"id\" AS \"uid\""
        );
    }
}
