//! Filter records and their operands.

use super::Query;
use crate::ast::{ComparisonOperator, Connective, DatePart};
use crate::value::{SqlValue, ToSqlValue};

/// SQL text passed through verbatim, with values for its `?` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFragment {
    pub sql: String,
    pub bindings: Vec<SqlValue>,
}

impl RawFragment {
    /// Creates a fragment without bindings.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }

    /// Adds a value for the next placeholder.
    #[must_use]
    pub fn bind<T: ToSqlValue>(mut self, value: T) -> Self {
        self.bindings.push(value.to_sql_value());
        self
    }
}

/// The right-hand side of a comparison, or a value in a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Bound as a parameter.
    Value(SqlValue),
    /// A column reference, parsed as a fragment.
    Column(String),
    /// Verbatim SQL.
    Raw(RawFragment),
    /// A sub-query, compiled recursively.
    Sub(Box<Query>),
}

impl Operand {
    /// Creates a column operand.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }

    /// Creates a raw operand.
    #[must_use]
    pub fn raw(fragment: RawFragment) -> Self {
        Self::Raw(fragment)
    }

    /// Creates a sub-query operand.
    #[must_use]
    pub fn sub(query: Query) -> Self {
        Self::Sub(Box::new(query))
    }
}

impl<T: ToSqlValue> From<T> for Operand {
    fn from(value: T) -> Self {
        Self::Value(value.to_sql_value())
    }
}

/// One filter, as recorded by the builder.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereKind {
    /// `column <op> operand`
    Basic {
        column: String,
        operator: ComparisonOperator,
        value: Operand,
    },
    /// `column [NOT] IN (values)`
    In {
        column: String,
        values: Vec<SqlValue>,
        not: bool,
    },
    /// `column [NOT] IN (sub-query)`
    InSub {
        column: String,
        query: Box<Query>,
        not: bool,
    },
    /// `column IS [NOT] NULL`
    Null { column: String, not: bool },
    /// `column [NOT] BETWEEN low AND high`
    Between {
        column: String,
        low: Operand,
        high: Operand,
        not: bool,
    },
    /// `[NOT] EXISTS (sub-query)`
    Exists { query: Box<Query>, not: bool },
    /// A parenthesized group.
    Nested(Vec<Where>),
    /// Verbatim SQL.
    Raw(RawFragment),
    /// Compares a calendar part of a date/time column.
    Date {
        column: String,
        part: DatePart,
        operator: ComparisonOperator,
        value: SqlValue,
    },
    /// Compares the length of a JSON array.
    JsonLength {
        column: String,
        operator: ComparisonOperator,
        value: SqlValue,
    },
    /// `column [NOT] LIKE pattern`
    Like {
        column: String,
        pattern: SqlValue,
        case_sensitive: bool,
        not: bool,
    },
}

/// A filter with the connective that joins it to the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    pub boolean: Connective,
    pub kind: WhereKind,
}

impl Where {
    /// Creates an `AND` filter.
    #[must_use]
    pub const fn and(kind: WhereKind) -> Self {
        Self {
            boolean: Connective::And,
            kind,
        }
    }

    /// Creates an `OR` filter.
    #[must_use]
    pub const fn or(kind: WhereKind) -> Self {
        Self {
            boolean: Connective::Or,
            kind,
        }
    }
}

/// Shared builder methods for anything that collects filters.
///
/// Implemented by [`Query`] for WHERE and by [`super::JoinClause`] for ON.
pub trait Filterable: Sized {
    /// Appends a filter.
    #[must_use]
    fn push_where(self, filter: Where) -> Self;

    /// `column <op> value`
    #[must_use]
    fn where_cmp(
        self,
        column: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<Operand>,
    ) -> Self {
        self.push_where(Where::and(WhereKind::Basic {
            column: column.into(),
            operator,
            value: value.into(),
        }))
    }

    /// `OR column <op> value`
    #[must_use]
    fn or_where_cmp(
        self,
        column: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<Operand>,
    ) -> Self {
        self.push_where(Where::or(WhereKind::Basic {
            column: column.into(),
            operator,
            value: value.into(),
        }))
    }

    /// `column = value`
    #[must_use]
    fn where_eq(self, column: impl Into<String>, value: impl Into<Operand>) -> Self {
        self.where_cmp(column, ComparisonOperator::Eq, value)
    }

    /// `OR column = value`
    #[must_use]
    fn or_where_eq(self, column: impl Into<String>, value: impl Into<Operand>) -> Self {
        self.or_where_cmp(column, ComparisonOperator::Eq, value)
    }

    /// `first <op> second`, both columns.
    #[must_use]
    fn where_column(
        self,
        first: impl Into<String>,
        operator: ComparisonOperator,
        second: impl Into<String>,
    ) -> Self {
        self.where_cmp(first, operator, Operand::Column(second.into()))
    }

    /// `column IN (values)`
    #[must_use]
    fn where_in<T: ToSqlValue>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.push_where(Where::and(WhereKind::In {
            column: column.into(),
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            not: false,
        }))
    }

    /// `column NOT IN (values)`
    #[must_use]
    fn where_not_in<T: ToSqlValue>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.push_where(Where::and(WhereKind::In {
            column: column.into(),
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            not: true,
        }))
    }

    /// `OR column IN (values)`
    #[must_use]
    fn or_where_in<T: ToSqlValue>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.push_where(Where::or(WhereKind::In {
            column: column.into(),
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            not: false,
        }))
    }

    /// `column IN (sub-query)`
    #[must_use]
    fn where_in_sub(self, column: impl Into<String>, query: Query) -> Self {
        self.push_where(Where::and(WhereKind::InSub {
            column: column.into(),
            query: Box::new(query),
            not: false,
        }))
    }

    /// `column NOT IN (sub-query)`
    #[must_use]
    fn where_not_in_sub(self, column: impl Into<String>, query: Query) -> Self {
        self.push_where(Where::and(WhereKind::InSub {
            column: column.into(),
            query: Box::new(query),
            not: true,
        }))
    }

    /// `column IS NULL`
    #[must_use]
    fn where_null(self, column: impl Into<String>) -> Self {
        self.push_where(Where::and(WhereKind::Null {
            column: column.into(),
            not: false,
        }))
    }

    /// `column IS NOT NULL`
    #[must_use]
    fn where_not_null(self, column: impl Into<String>) -> Self {
        self.push_where(Where::and(WhereKind::Null {
            column: column.into(),
            not: true,
        }))
    }

    /// `OR column IS NULL`
    #[must_use]
    fn or_where_null(self, column: impl Into<String>) -> Self {
        self.push_where(Where::or(WhereKind::Null {
            column: column.into(),
            not: false,
        }))
    }

    /// `column BETWEEN low AND high`
    #[must_use]
    fn where_between(
        self,
        column: impl Into<String>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        self.push_where(Where::and(WhereKind::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            not: false,
        }))
    }

    /// `column NOT BETWEEN low AND high`
    #[must_use]
    fn where_not_between(
        self,
        column: impl Into<String>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        self.push_where(Where::and(WhereKind::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            not: true,
        }))
    }

    /// `EXISTS (sub-query)`
    #[must_use]
    fn where_exists(self, query: Query) -> Self {
        self.push_where(Where::and(WhereKind::Exists {
            query: Box::new(query),
            not: false,
        }))
    }

    /// `NOT EXISTS (sub-query)`
    #[must_use]
    fn where_not_exists(self, query: Query) -> Self {
        self.push_where(Where::and(WhereKind::Exists {
            query: Box::new(query),
            not: true,
        }))
    }

    /// `(…)`, built from a fresh query's filters.
    #[must_use]
    fn where_nested(self, build: impl FnOnce(Query) -> Query) -> Self {
        let group = build(Query::new());
        self.push_where(Where::and(WhereKind::Nested(group.wheres)))
    }

    /// `OR (…)`, built from a fresh query's filters.
    #[must_use]
    fn or_where_nested(self, build: impl FnOnce(Query) -> Query) -> Self {
        let group = build(Query::new());
        self.push_where(Where::or(WhereKind::Nested(group.wheres)))
    }

    /// Verbatim SQL.
    #[must_use]
    fn where_raw(self, fragment: RawFragment) -> Self {
        self.push_where(Where::and(WhereKind::Raw(fragment)))
    }

    /// `OR` verbatim SQL.
    #[must_use]
    fn or_where_raw(self, fragment: RawFragment) -> Self {
        self.push_where(Where::or(WhereKind::Raw(fragment)))
    }

    /// Compares one calendar part of `column`.
    #[must_use]
    fn where_date(
        self,
        column: impl Into<String>,
        part: DatePart,
        operator: ComparisonOperator,
        value: impl ToSqlValue,
    ) -> Self {
        self.push_where(Where::and(WhereKind::Date {
            column: column.into(),
            part,
            operator,
            value: value.to_sql_value(),
        }))
    }

    /// Compares the length of the JSON array at `column` (`meta->tags`).
    #[must_use]
    fn where_json_length(
        self,
        column: impl Into<String>,
        operator: ComparisonOperator,
        value: impl ToSqlValue,
    ) -> Self {
        self.push_where(Where::and(WhereKind::JsonLength {
            column: column.into(),
            operator,
            value: value.to_sql_value(),
        }))
    }

    /// `column LIKE pattern`
    #[must_use]
    fn where_like(
        self,
        column: impl Into<String>,
        pattern: impl ToSqlValue,
        case_sensitive: bool,
    ) -> Self {
        self.push_where(Where::and(WhereKind::Like {
            column: column.into(),
            pattern: pattern.to_sql_value(),
            case_sensitive,
            not: false,
        }))
    }

    /// `column NOT LIKE pattern`
    #[must_use]
    fn where_not_like(
        self,
        column: impl Into<String>,
        pattern: impl ToSqlValue,
        case_sensitive: bool,
    ) -> Self {
        self.push_where(Where::and(WhereKind::Like {
            column: column.into(),
            pattern: pattern.to_sql_value(),
            case_sensitive,
            not: true,
        }))
    }
}
