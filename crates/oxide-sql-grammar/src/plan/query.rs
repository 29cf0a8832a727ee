//! The query plan and its builder methods.

use super::condition::{Filterable, Operand, RawFragment, Where, WhereKind};
use super::join::JoinClause;
use super::{JoinType, Lock, OrderDirection};
use crate::ast::{AggregateFunction, ComparisonOperator};

/// One select-list entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A column fragment such as `users.id as uid` or `meta->name`.
    Column(String),
    /// Verbatim SQL.
    Raw(RawFragment),
    /// A scalar sub-query.
    Sub { query: Box<Query>, alias: String },
}

/// The FROM source.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A table fragment such as `users as u`.
    Table(String),
    /// A derived table.
    Sub { query: Box<Query>, alias: String },
    /// Verbatim SQL.
    Raw(RawFragment),
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Order {
    Column {
        column: String,
        direction: OrderDirection,
    },
    Raw(RawFragment),
}

/// A query unioned onto this one.
#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    pub query: Query,
    pub all: bool,
}

/// An aggregate that replaces the select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub function: AggregateFunction,
    /// `None` means `*`.
    pub column: Option<String>,
    pub distinct: bool,
}

/// A query plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub distinct: bool,
    pub columns: Vec<Selection>,
    pub from: Option<Source>,
    pub joins: Vec<JoinClause>,
    pub wheres: Vec<Where>,
    pub groups: Vec<String>,
    pub havings: Vec<Where>,
    pub orders: Vec<Order>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub unions: Vec<Union>,
    pub union_orders: Vec<Order>,
    pub union_limit: Option<u64>,
    pub union_offset: Option<u64>,
    pub aggregate: Option<Aggregate>,
    pub lock: Option<Lock>,
}

impl Query {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a plan over a table.
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        Self::new().from(table)
    }

    /// Sets the FROM table.
    #[must_use]
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.from = Some(Source::Table(table.into()));
        self
    }

    /// Selects from a derived table.
    #[must_use]
    pub fn from_sub(mut self, query: Self, alias: impl Into<String>) -> Self {
        self.from = Some(Source::Sub {
            query: Box::new(query),
            alias: alias.into(),
        });
        self
    }

    /// Selects from verbatim SQL.
    #[must_use]
    pub fn from_raw(mut self, fragment: RawFragment) -> Self {
        self.from = Some(Source::Raw(fragment));
        self
    }

    /// Replaces the select list.
    #[must_use]
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns
            .iter()
            .map(|c| Selection::Column(String::from(*c)))
            .collect();
        self
    }

    /// Adds a column to the select list.
    #[must_use]
    pub fn add_select(mut self, column: impl Into<String>) -> Self {
        self.columns.push(Selection::Column(column.into()));
        self
    }

    /// Adds verbatim SQL to the select list.
    #[must_use]
    pub fn select_raw(mut self, fragment: RawFragment) -> Self {
        self.columns.push(Selection::Raw(fragment));
        self
    }

    /// Adds a scalar sub-query to the select list.
    #[must_use]
    pub fn select_sub(mut self, query: Self, alias: impl Into<String>) -> Self {
        self.columns.push(Selection::Sub {
            query: Box::new(query),
            alias: alias.into(),
        });
        self
    }

    /// Adds DISTINCT.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Adds a prepared join.
    #[must_use]
    pub fn join_clause(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    /// `INNER JOIN table ON first <op> second`
    #[must_use]
    pub fn join(
        self,
        table: impl Into<String>,
        first: impl Into<String>,
        operator: ComparisonOperator,
        second: impl Into<String>,
    ) -> Self {
        self.join_clause(JoinClause::new(JoinType::Inner, table).on(first, operator, second))
    }

    /// `LEFT JOIN table ON first <op> second`
    #[must_use]
    pub fn left_join(
        self,
        table: impl Into<String>,
        first: impl Into<String>,
        operator: ComparisonOperator,
        second: impl Into<String>,
    ) -> Self {
        self.join_clause(JoinClause::new(JoinType::Left, table).on(first, operator, second))
    }

    /// `RIGHT JOIN table ON first <op> second`
    #[must_use]
    pub fn right_join(
        self,
        table: impl Into<String>,
        first: impl Into<String>,
        operator: ComparisonOperator,
        second: impl Into<String>,
    ) -> Self {
        self.join_clause(JoinClause::new(JoinType::Right, table).on(first, operator, second))
    }

    /// `CROSS JOIN table`
    #[must_use]
    pub fn cross_join(self, table: impl Into<String>) -> Self {
        self.join_clause(JoinClause::new(JoinType::Cross, table))
    }

    /// `INNER JOIN (sub-query) AS alias ON first <op> second`
    #[must_use]
    pub fn join_sub(
        self,
        query: Self,
        alias: impl Into<String>,
        first: impl Into<String>,
        operator: ComparisonOperator,
        second: impl Into<String>,
    ) -> Self {
        self.join_clause(JoinClause::sub(JoinType::Inner, query, alias).on(first, operator, second))
    }

    /// Adds GROUP BY columns.
    #[must_use]
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.groups.extend(columns.iter().map(|c| String::from(*c)));
        self
    }

    /// `HAVING column <op> value`
    #[must_use]
    pub fn having(
        mut self,
        column: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<Operand>,
    ) -> Self {
        self.havings.push(Where::and(WhereKind::Basic {
            column: column.into(),
            operator,
            value: value.into(),
        }));
        self
    }

    /// `OR column <op> value` in HAVING.
    #[must_use]
    pub fn or_having(
        mut self,
        column: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<Operand>,
    ) -> Self {
        self.havings.push(Where::or(WhereKind::Basic {
            column: column.into(),
            operator,
            value: value.into(),
        }));
        self
    }

    /// Verbatim SQL in HAVING.
    #[must_use]
    pub fn having_raw(mut self, fragment: RawFragment) -> Self {
        self.havings.push(Where::and(WhereKind::Raw(fragment)));
        self
    }

    /// Orders ascending by a column.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.orders.push(Order::Column {
            column: column.into(),
            direction: OrderDirection::Asc,
        });
        self
    }

    /// Orders descending by a column.
    #[must_use]
    pub fn order_by_desc(mut self, column: impl Into<String>) -> Self {
        self.orders.push(Order::Column {
            column: column.into(),
            direction: OrderDirection::Desc,
        });
        self
    }

    /// Orders by verbatim SQL.
    #[must_use]
    pub fn order_by_raw(mut self, fragment: RawFragment) -> Self {
        self.orders.push(Order::Raw(fragment));
        self
    }

    /// Sets LIMIT.
    #[must_use]
    pub const fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    /// Sets OFFSET.
    #[must_use]
    pub const fn offset(mut self, count: u64) -> Self {
        self.offset = Some(count);
        self
    }

    /// `UNION query`
    #[must_use]
    pub fn union(mut self, query: Self) -> Self {
        self.unions.push(Union { query, all: false });
        self
    }

    /// `UNION ALL query`
    #[must_use]
    pub fn union_all(mut self, query: Self) -> Self {
        self.unions.push(Union { query, all: true });
        self
    }

    /// Orders the whole union.
    #[must_use]
    pub fn union_order_by(mut self, column: impl Into<String>, direction: OrderDirection) -> Self {
        self.union_orders.push(Order::Column {
            column: column.into(),
            direction,
        });
        self
    }

    /// Limits the whole union.
    #[must_use]
    pub const fn union_limit(mut self, count: u64) -> Self {
        self.union_limit = Some(count);
        self
    }

    /// Offsets the whole union.
    #[must_use]
    pub const fn union_offset(mut self, count: u64) -> Self {
        self.union_offset = Some(count);
        self
    }

    /// Replaces the select list with an aggregate.
    #[must_use]
    pub fn aggregate(mut self, function: AggregateFunction, column: Option<&str>) -> Self {
        self.aggregate = Some(Aggregate {
            function,
            column: column.map(String::from),
            distinct: false,
        });
        self
    }

    /// `count(*)`
    #[must_use]
    pub fn count(self) -> Self {
        self.aggregate(AggregateFunction::Count, None)
    }

    /// `count(DISTINCT column)`
    #[must_use]
    pub fn count_distinct(mut self, column: &str) -> Self {
        self.aggregate = Some(Aggregate {
            function: AggregateFunction::Count,
            column: Some(String::from(column)),
            distinct: true,
        });
        self
    }

    /// Sets the lock.
    #[must_use]
    pub fn lock(mut self, lock: Lock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Exclusive row lock.
    #[must_use]
    pub fn lock_for_update(self) -> Self {
        self.lock(Lock::Update)
    }

    /// Shared row lock.
    #[must_use]
    pub fn shared_lock(self) -> Self {
        self.lock(Lock::Shared)
    }
}

impl Filterable for Query {
    fn push_where(mut self, filter: Where) -> Self {
        self.wheres.push(filter);
        self
    }
}

/// Column/value pairs for INSERT and UPDATE, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<(String, Operand)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Sets a column, replacing an earlier value for the same column.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Operand>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.values.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.values.push((column, value)),
        }
        self
    }

    /// Returns the column names.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(c, _)| c.as_str())
    }

    /// Returns the value set for `column`.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Operand> {
        self.values.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    /// Returns the pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Operand)> {
        self.values.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when no column is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Operand>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |row, (column, value)| row.set(column, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    #[test]
    fn test_builder_accumulates_clauses() {
        let query = Query::table("users as u")
            .select(&["u.id", "u.name"])
            .join("posts as p", "p.user_id", ComparisonOperator::Eq, "u.id")
            .where_eq("u.active", true)
            .order_by_desc("u.created_at")
            .limit(10)
            .offset(20);

        assert_eq!(query.from, Some(Source::Table(String::from("users as u"))));
        assert_eq!(query.columns.len(), 2);
        assert_eq!(query.joins.len(), 1);
        assert_eq!(query.joins[0].conditions.len(), 1);
        assert_eq!(query.wheres.len(), 1);
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(20));
    }

    #[test]
    fn test_unions_and_union_pagination_are_separate() {
        let query = Query::table("a")
            .limit(5)
            .union_all(Query::table("b"))
            .union_limit(3);
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.union_limit, Some(3));
        assert!(query.unions[0].all);
    }

    #[test]
    fn test_row_set_replaces_existing_column() {
        let row = Row::new().set("name", "a").set("age", 3).set("name", "b");
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["name", "age"]);
        let (_, name) = row.iter().next().unwrap();
        assert_eq!(name, &Operand::Value(SqlValue::Text(String::from("b"))));
    }

    #[test]
    fn test_row_from_iterator() {
        let row: Row = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_aggregate_helpers() {
        let query = Query::table("users").count_distinct("email");
        let aggregate = query.aggregate.unwrap();
        assert_eq!(aggregate.function, AggregateFunction::Count);
        assert!(aggregate.distinct);
    }
}
