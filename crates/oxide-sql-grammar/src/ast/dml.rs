//! INSERT, UPDATE, DELETE and TRUNCATE nodes.

use super::expression::{Expression, NestedExpression};
use super::identifier::{Identifier, PathExpression, TableName};
use super::query::{FromClause, LimitClause, OrderByClause, TableReference, WhereClause};

/// Where the inserted rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// One or more `VALUES` tuples, each as long as the column list.
    Values(Vec<Vec<Expression>>),
    /// `INSERT … SELECT`.
    Query(NestedExpression),
    /// A single row of column defaults.
    DefaultValues,
}

/// `ON CONFLICT`/`ON DUPLICATE KEY`/`MERGE` parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertClause {
    /// Columns identifying an existing row.
    pub unique_by: Vec<Identifier>,
    /// Columns overwritten with the incoming value on conflict.
    pub update: Vec<Identifier>,
}

/// What happens when an inserted row collides with an existing one.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictClause {
    /// Skip the row.
    Ignore,
    /// Overwrite the listed columns.
    Update(UpsertClause),
}

/// Post-insert id retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturningClause {
    pub column: Identifier,
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertSpecification {
    pub table: TableName,
    pub columns: Vec<Identifier>,
    pub source: InsertSource,
    pub conflict: Option<ConflictClause>,
    pub returning: Option<ReturningClause>,
}

/// `column = value` in an UPDATE.
///
/// The column is qualified with the target table only when the statement
/// has joins.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentSetClause {
    pub column: PathExpression,
    pub value: Expression,
}

/// An UPDATE statement.
///
/// `table` is what follows `UPDATE`: a plain table, or a joined table on
/// engines with native multi-table updates. `from` is set by engines that
/// list joins in a trailing `FROM`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSpecification {
    pub table: TableReference,
    pub assignments: Vec<AssignmentSetClause>,
    pub from: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
    /// Whether the statement joins other tables.
    pub has_joins: bool,
}

/// A DELETE statement.
///
/// `target` names the table rows are removed from when it differs from
/// the FROM list (`DELETE u FROM users AS u JOIN …`).
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteSpecification {
    pub target: Option<Identifier>,
    pub from: FromClause,
    pub where_clause: Option<WhereClause>,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
}

/// A TRUNCATE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncateSpecification {
    pub table: TableName,
}
