//! Join records.

use super::condition::{Filterable, Operand, Where, WhereKind};
use super::{JoinType, Query};
use crate::ast::ComparisonOperator;

/// What a join attaches.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinTarget {
    /// A table fragment such as `posts as p`.
    Table(String),
    /// A sub-query with an alias.
    Sub { query: Box<Query>, alias: String },
}

/// A join and its ON conditions.
///
/// ON conditions reuse the WHERE filter records, so a join can compare
/// columns (`on`) or bind values (`where_value`).
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinType,
    pub target: JoinTarget,
    pub conditions: Vec<Where>,
}

impl JoinClause {
    /// Creates a join to a table.
    #[must_use]
    pub fn new(kind: JoinType, table: impl Into<String>) -> Self {
        Self {
            kind,
            target: JoinTarget::Table(table.into()),
            conditions: Vec::new(),
        }
    }

    /// Creates a join to a sub-query.
    #[must_use]
    pub fn sub(kind: JoinType, query: Query, alias: impl Into<String>) -> Self {
        Self {
            kind,
            target: JoinTarget::Sub {
                query: Box::new(query),
                alias: alias.into(),
            },
            conditions: Vec::new(),
        }
    }

    /// `ON first <op> second`, both columns.
    #[must_use]
    pub fn on(
        self,
        first: impl Into<String>,
        operator: ComparisonOperator,
        second: impl Into<String>,
    ) -> Self {
        self.where_column(first, operator, second)
    }

    /// `OR first <op> second`, both columns.
    #[must_use]
    pub fn or_on(
        self,
        first: impl Into<String>,
        operator: ComparisonOperator,
        second: impl Into<String>,
    ) -> Self {
        self.or_where_cmp(first, operator, Operand::Column(second.into()))
    }

    /// `ON column <op> ?`
    #[must_use]
    pub fn where_value(
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
}

impl Filterable for JoinClause {
    fn push_where(mut self, filter: Where) -> Self {
        self.conditions.push(filter);
        self
    }
}
