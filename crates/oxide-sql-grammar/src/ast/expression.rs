//! Expression and predicate nodes.

use super::identifier::{JsonPathExpression, PathExpression};
use super::query::QueryExpression;
use crate::binding::BindingType;
use crate::plan::Query;
use crate::value::SqlValue;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl ComparisonOperator {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }
}

/// Boolean connective of a [`ConditionExpression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connective {
    #[default]
    And,
    Or,
}

impl Connective {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// The calendar part a date function extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    /// The date portion of a datetime.
    Date,
    /// The time portion of a datetime.
    Time,
    Day,
    Month,
    Year,
}

impl DatePart {
    /// Returns the lowercase name used by `day()`/`extract(day from …)` style functions.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

/// Dialect-neutral function names. Dialects map them to concrete syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionName {
    /// Extracts a calendar part.
    Date(DatePart),
    /// Length of a JSON array.
    JsonLength,
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    /// Returns the SQL function name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

/// A value rendered as a placeholder and registered as a binding.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingVariable {
    /// The bound value.
    pub value: SqlValue,
    /// The bucket the value belongs to.
    pub purpose: BindingType,
}

/// SQL text emitted verbatim. Its bindings match the `?` inside `sql`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExpression {
    /// The SQL text.
    pub sql: String,
    /// Values for the placeholders inside `sql`.
    pub bindings: Vec<SqlValue>,
}

/// What a [`NestedExpression`] wraps.
#[derive(Debug, Clone, PartialEq)]
pub enum NestedSource {
    /// A plan compiled recursively with a fresh visitor.
    Plan(Box<Query>),
    /// A raw fragment with its own bindings.
    Raw(RawExpression),
    /// An already lowered query, rendered in place.
    Query(Box<QueryExpression>),
}

/// A parenthesized sub-query or fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedExpression {
    /// The wrapped source.
    pub source: NestedSource,
}

impl NestedExpression {
    /// Wraps a plan.
    #[must_use]
    pub fn plan(query: Query) -> Self {
        Self {
            source: NestedSource::Plan(Box::new(query)),
        }
    }

    /// Wraps a lowered query.
    #[must_use]
    pub fn query(query: QueryExpression) -> Self {
        Self {
            source: NestedSource::Query(Box::new(query)),
        }
    }
}

/// A call to a dialect-mapped function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpression {
    pub name: FunctionName,
    pub arguments: Vec<Expression>,
}

/// `count(*)`, `sum(DISTINCT x)`, …
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpression {
    pub function: AggregateFunction,
    pub distinct: bool,
    /// Empty means `*`.
    pub arguments: Vec<Expression>,
}

/// `left <op> right`
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonPredicateExpression {
    pub left: Box<Expression>,
    pub operator: ComparisonOperator,
    pub right: Box<Expression>,
}

/// `operand [NOT] BETWEEN low AND high`
#[derive(Debug, Clone, PartialEq)]
pub struct BetweenPredicateExpression {
    pub operand: Box<Expression>,
    pub low: Box<Expression>,
    pub high: Box<Expression>,
    pub not: bool,
}

/// Right-hand side of an IN predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum InValues {
    List(Vec<Expression>),
    Subquery(NestedExpression),
}

/// `operand [NOT] IN (…)`
///
/// An empty list renders as `0 = 1`, or `1 = 1` when negated.
#[derive(Debug, Clone, PartialEq)]
pub struct InPredicateExpression {
    pub operand: Box<Expression>,
    pub values: InValues,
    pub not: bool,
}

/// `operand IS [NOT] NULL`
#[derive(Debug, Clone, PartialEq)]
pub struct NullPredicateExpression {
    pub operand: Box<Expression>,
    pub not: bool,
}

/// `[NOT] EXISTS (…)`
#[derive(Debug, Clone, PartialEq)]
pub struct ExistsPredicateExpression {
    pub query: NestedExpression,
    pub not: bool,
}

/// `operand [NOT] LIKE pattern`, with dialect-specific case handling.
#[derive(Debug, Clone, PartialEq)]
pub struct LikePredicateExpression {
    pub operand: Box<Expression>,
    pub pattern: Box<Expression>,
    pub case_sensitive: bool,
    pub not: bool,
}

/// Terms joined by one connective.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionExpression {
    pub connective: Connective,
    pub terms: Vec<Expression>,
}

/// Every expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Path(PathExpression),
    Json(JsonPathExpression),
    Binding(BindingVariable),
    Raw(RawExpression),
    Nested(NestedExpression),
    Function(FunctionExpression),
    Aggregate(AggregateExpression),
    Comparison(ComparisonPredicateExpression),
    Between(BetweenPredicateExpression),
    In(InPredicateExpression),
    Null(NullPredicateExpression),
    Exists(ExistsPredicateExpression),
    Like(LikePredicateExpression),
    Condition(ConditionExpression),
    /// A user-grouped condition, always parenthesized.
    Parenthesized(Box<Expression>),
}

impl Expression {
    /// Creates a binding.
    #[must_use]
    pub const fn binding(value: SqlValue, purpose: BindingType) -> Self {
        Self::Binding(BindingVariable { value, purpose })
    }

    /// Creates a raw expression without bindings.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(RawExpression {
            sql: sql.into(),
            bindings: Vec::new(),
        })
    }

    /// Creates a comparison.
    #[must_use]
    pub fn compare(self, operator: ComparisonOperator, right: Self) -> Self {
        Self::Comparison(ComparisonPredicateExpression {
            left: Box::new(self),
            operator,
            right: Box::new(right),
        })
    }

    /// Creates an IN predicate.
    #[must_use]
    pub fn in_values(self, values: InValues, not: bool) -> Self {
        Self::In(InPredicateExpression {
            operand: Box::new(self),
            values,
            not,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_strings() {
        assert_eq!(ComparisonOperator::NotEq.as_str(), "!=");
        assert_eq!(ComparisonOperator::GtEq.as_str(), ">=");
        assert_eq!(Connective::Or.as_str(), "OR");
        assert_eq!(AggregateFunction::Avg.as_str(), "avg");
        assert_eq!(DatePart::Month.as_str(), "month");
    }

    #[test]
    fn test_expression_builders() {
        let expr = Expression::Path(PathExpression::single("age")).compare(
            ComparisonOperator::Gt,
            Expression::binding(SqlValue::Int(18), BindingType::Where),
        );
        assert!(matches!(
            expr,
            Expression::Comparison(ComparisonPredicateExpression {
                operator: ComparisonOperator::Gt,
                ..
            })
        ));
    }
}
