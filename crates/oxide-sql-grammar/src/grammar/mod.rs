//! Plan lowering and the public compile entry points.
//!
//! A [`Grammar`] turns a [`Query`] into an AST [`Statement`] and hands it to
//! a fresh [`Visitor`]. Every compile call is a pure function of the plan and
//! the dialect: the plan is borrowed read-only and the bindings come back
//! with the text.

mod conditions;
mod dml;
mod select;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::ast::{Identifier, PathExpression, Statement, TableName};
use crate::binding::Bindings;
use crate::config::GrammarConfig;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::fragment::{parse_column, parse_table};
use crate::plan::Query;
use crate::value::SqlValue;
use crate::visitor::Visitor;

/// SQL text plus its bindings in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub bindings: Bindings,
}

impl CompiledQuery {
    /// Returns the positional parameter list.
    #[must_use]
    pub fn values(&self) -> Vec<SqlValue> {
        self.bindings.values()
    }
}

/// Compiles query plans for one dialect.
#[derive(Debug, Clone)]
pub struct Grammar<'d> {
    dialect: &'d dyn Dialect,
    table_prefix: String,
}

impl<'d> Grammar<'d> {
    /// Creates a grammar without a table prefix.
    #[must_use]
    pub const fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            table_prefix: String::new(),
        }
    }

    /// Sets the prefix prepended to every table name, table alias and
    /// column qualifier.
    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// Returns the active dialect.
    #[must_use]
    pub const fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Returns the table prefix.
    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    /// Compiles a SELECT.
    ///
    /// # Errors
    ///
    /// Returns an error when the plan cannot be expressed in this dialect.
    pub fn compile_select(&self, query: &Query) -> Result<CompiledQuery> {
        let statement = Statement::Query(self.lower_query(query)?);
        self.compile("select", &statement)
    }

    /// Compiles `SELECT EXISTS (…)`, or the dialect's equivalent.
    ///
    /// # Errors
    ///
    /// Returns an error when the plan cannot be expressed in this dialect.
    pub fn compile_exists(&self, query: &Query) -> Result<CompiledQuery> {
        let statement = Statement::Query(self.lower_exists(query)?);
        self.compile("exists", &statement)
    }

    /// Quotes a column fragment such as `users.id as uid`.
    ///
    /// # Errors
    ///
    /// Returns an error when `column` is not a column fragment.
    pub fn quote_column_name(&self, column: &str) -> Result<String> {
        let parsed = parse_column(column)?;
        let mut sql = self.quote_path(&self.prefix_qualifier(parsed.path));
        if !parsed.json.is_empty() {
            sql = self.dialect.json_selector(&sql, &parsed.json);
        }
        if let Some(alias) = parsed.alias {
            sql.push_str(" AS ");
            sql.push_str(&self.dialect.quote_identifier(alias.as_str()));
        }
        Ok(sql)
    }

    /// Quotes a table fragment such as `public.users as u`.
    ///
    /// # Errors
    ///
    /// Returns an error when `table` is not a table fragment.
    pub fn quote_table_name(&self, table: &str) -> Result<String> {
        let table = self.table_name(table)?;
        let mut sql = self.quote_path(&table.path);
        if let Some(alias) = table.alias {
            sql.push_str(" AS ");
            sql.push_str(&self.dialect.quote_identifier(alias.as_str()));
        }
        Ok(sql)
    }

    /// Quotes a schema name. Schemas are never prefixed.
    #[must_use]
    pub fn quote_schema_name(&self, schema: &str) -> String {
        self.dialect.quote_identifier(schema)
    }

    /// Returns the DISTINCT keyword fragment.
    #[must_use]
    pub const fn distinct(&self, distinct: bool) -> &'static str {
        if distinct {
            "DISTINCT "
        } else {
            ""
        }
    }

    /// Returns the chrono format string for stored timestamps.
    #[must_use]
    pub fn date_format(&self) -> &'static str {
        self.dialect.date_format()
    }

    /// Formats a timestamp with [`Grammar::date_format`].
    #[must_use]
    pub fn format_timestamp(&self, timestamp: &NaiveDateTime) -> String {
        timestamp.format(self.date_format()).to_string()
    }

    pub(crate) fn quote_path(&self, path: &PathExpression) -> String {
        path.segments
            .iter()
            .map(|segment| self.dialect.quote_identifier(segment.as_str()))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn prefixed(&self, name: &Identifier) -> Identifier {
        if self.table_prefix.is_empty() {
            name.clone()
        } else {
            Identifier::new(format!("{}{}", self.table_prefix, name.as_str()))
        }
    }

    /// Parses a table fragment and prefixes its name and alias.
    pub(crate) fn table_name(&self, fragment: &str) -> Result<TableName> {
        let parsed = parse_table(fragment)?;
        let mut segments = parsed.path.segments;
        if let Some(last) = segments.last_mut() {
            *last = self.prefixed(last);
        }
        Ok(TableName {
            path: PathExpression::new(segments),
            alias: parsed.alias.map(|alias| self.prefixed(&alias)),
        })
    }

    /// Prefixes the table segment of a qualified column path.
    pub(crate) fn prefix_qualifier(&self, path: PathExpression) -> PathExpression {
        let mut segments = path.segments;
        if segments.len() >= 2 {
            let table = segments.len() - 2;
            segments[table] = self.prefixed(&segments[table]);
        }
        PathExpression::new(segments)
    }

    /// Renders without logging. Used for nested plans.
    pub(crate) fn compile_nested(&self, query: &Query) -> Result<CompiledQuery> {
        self.render(&Statement::Query(self.lower_query(query)?))
    }

    fn render(&self, statement: &Statement) -> Result<CompiledQuery> {
        let (sql, bindings) = Visitor::new(self).render(statement)?;
        debug_assert_eq!(
            count_placeholders(&sql, self.dialect.parameter_placeholder()),
            bindings.len(),
            "placeholder count does not match binding count in `{sql}`"
        );
        Ok(CompiledQuery { sql, bindings })
    }

    fn compile(&self, operation: &'static str, statement: &Statement) -> Result<CompiledQuery> {
        Ok(self.finish(operation, self.render(statement)?))
    }

    fn finish(&self, operation: &'static str, compiled: CompiledQuery) -> CompiledQuery {
        debug!(
            dialect = self.dialect.name(),
            operation,
            sql = %compiled.sql,
            bindings = compiled.bindings.len(),
            "Compiled statement"
        );
        compiled
    }
}

impl Grammar<'static> {
    /// Creates a grammar from configuration.
    #[must_use]
    pub fn from_config(config: &GrammarConfig) -> Self {
        Self::new(config.dialect.dialect()).with_table_prefix(config.table_prefix.clone())
    }
}

/// Counts `placeholder` occurrences outside quoted identifiers and string
/// literals.
#[must_use]
pub fn count_placeholders(sql: &str, placeholder: &str) -> usize {
    let mut count = 0;
    let mut closing: Option<char> = None;
    let mut chars = sql.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match closing {
            Some(close) if c == close => {
                // A doubled closing quote is an escaped quote.
                if chars.peek().is_some_and(|&(_, next)| next == close) {
                    chars.next();
                } else {
                    closing = None;
                }
            }
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => closing = Some(c),
                '[' => closing = Some(']'),
                _ if sql[i..].starts_with(placeholder) => count += 1,
                _ => {}
            },
        }
    }
    count
}
