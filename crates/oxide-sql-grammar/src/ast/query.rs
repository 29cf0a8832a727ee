//! Query specification, union and clause nodes.

use super::expression::{Expression, NestedExpression, RawExpression};
use super::identifier::{ColumnReferenceExpression, Identifier, PathExpression, TableName};
use crate::plan::{JoinType, Lock, OrderDirection};

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `*` or `table.*`.
    Wildcard(Option<PathExpression>),
    /// A column, optionally aliased.
    Column(ColumnReferenceExpression),
    /// Any other expression, optionally aliased.
    Expression {
        expression: Expression,
        alias: Option<Identifier>,
    },
}

/// The projected items of a query specification.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectList {
    pub items: Vec<SelectItem>,
}

impl SelectList {
    /// `SELECT *`
    #[must_use]
    pub fn wildcard() -> Self {
        Self {
            items: vec![SelectItem::Wildcard(None)],
        }
    }
}

/// A sub-query in FROM or JOIN.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTable {
    pub query: NestedExpression,
    pub alias: Identifier,
}

/// A table plus its joins, in the order they were added.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTable {
    pub table: Box<TableReference>,
    pub joins: Vec<JoinExpression>,
}

/// A single join.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinExpression {
    pub join_type: JoinType,
    pub target: TableReference,
    pub on: Option<Expression>,
}

/// Anything that can stand in FROM or as an UPDATE/DELETE target.
#[derive(Debug, Clone, PartialEq)]
pub enum TableReference {
    Table(TableName),
    Derived(DerivedTable),
    Joined(JoinedTable),
    Raw(RawExpression),
}

/// `FROM <table reference>`
#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub table: TableReference,
}

/// `WHERE <condition>`
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub condition: Expression,
}

/// `GROUP BY …`
#[derive(Debug, Clone, PartialEq)]
pub struct GroupByClause {
    pub expressions: Vec<Expression>,
}

/// `HAVING <condition>`
#[derive(Debug, Clone, PartialEq)]
pub struct HavingClause {
    pub condition: Expression,
}

/// One ORDER BY entry. Raw entries carry no direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpecification {
    pub expression: Expression,
    pub direction: Option<OrderDirection>,
}

/// `ORDER BY …`
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub sorts: Vec<SortSpecification>,
}

/// Row limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitClause {
    pub count: u64,
}

/// Row offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetClause {
    pub count: u64,
}

/// Row locking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockClause {
    pub lock: Lock,
}

/// A single SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpecification {
    pub distinct: bool,
    pub select_list: SelectList,
    pub from: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
    pub group_by: Option<GroupByClause>,
    pub having: Option<HavingClause>,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
    pub offset: Option<OffsetClause>,
    pub lock: Option<LockClause>,
}

impl QuerySpecification {
    /// Creates `SELECT <list>` with no other clause.
    #[must_use]
    pub const fn new(select_list: SelectList) -> Self {
        Self {
            distinct: false,
            select_list,
            from: None,
            where_clause: None,
            group_by: None,
            having: None,
            order_by: None,
            limit: None,
            offset: None,
            lock: None,
        }
    }
}

/// `left UNION [ALL] right`, with union-level ordering and pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryUnionQueryExpression {
    pub left: QueryExpression,
    pub right: QueryExpression,
    pub all: bool,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
    pub offset: Option<OffsetClause>,
}

/// A complete query: a single specification or a union tree.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpression {
    Specification(Box<QuerySpecification>),
    Union(Box<BinaryUnionQueryExpression>),
}
