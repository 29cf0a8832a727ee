//! Abstract Syntax Tree for compiled statements.
//!
//! Nodes are plain data. A [`Statement`] is produced by the grammar for
//! every compile call and consumed once by the visitor; nothing here holds
//! rendering state.

mod dml;
mod expression;
mod identifier;
mod query;

pub use dml::{
    AssignmentSetClause, ConflictClause, DeleteSpecification, InsertSource, InsertSpecification,
    ReturningClause, TruncateSpecification, UpdateSpecification, UpsertClause,
};
pub use expression::{
    AggregateExpression, AggregateFunction, BetweenPredicateExpression, BindingVariable,
    ComparisonOperator, ComparisonPredicateExpression, ConditionExpression, Connective, DatePart,
    ExistsPredicateExpression, Expression, FunctionExpression, FunctionName, InPredicateExpression,
    InValues, LikePredicateExpression, NestedExpression, NestedSource, NullPredicateExpression,
    RawExpression,
};
pub use identifier::{
    ColumnReferenceExpression, Identifier, JsonPathExpression, JsonSegment, PathExpression,
    TableName,
};
pub use query::{
    BinaryUnionQueryExpression, DerivedTable, FromClause, GroupByClause, HavingClause,
    JoinExpression, JoinedTable, LimitClause, LockClause, OffsetClause, OrderByClause,
    QueryExpression, QuerySpecification, SelectItem, SelectList, SortSpecification,
    TableReference, WhereClause,
};

/// A statement root.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Query(QueryExpression),
    Insert(InsertSpecification),
    Update(UpdateSpecification),
    Delete(DeleteSpecification),
    Truncate(TruncateSpecification),
}
