//! SELECT lowering.

use tracing::trace;

use super::conditions::raw_expression;
use super::Grammar;
use crate::ast::{
    AggregateExpression, BinaryUnionQueryExpression, ColumnReferenceExpression, DerivedTable,
    ExistsPredicateExpression, Expression, FromClause, GroupByClause, HavingClause, Identifier,
    JoinExpression, JoinedTable, LimitClause, LockClause, NestedExpression, OffsetClause,
    OrderByClause, PathExpression, QueryExpression, QuerySpecification, SelectItem, SelectList,
    SortSpecification, TableReference, WhereClause,
};
use crate::binding::BindingType;
use crate::dialect::ExistsStyle;
use crate::error::{GrammarError, Result};
use crate::fragment::parse_column;
use crate::plan::{Aggregate, JoinClause, JoinTarget, Order, Query, Selection, Source};
use crate::visitor::TEMP_TABLE;

/// Alias of an aggregate result column.
const AGGREGATE_ALIAS: &str = "aggregate";

/// Alias of the `compile_exists` result column.
const EXISTS_ALIAS: &str = "exists";

impl Grammar<'_> {
    /// Lowers a plan into a query expression.
    ///
    /// Unions fold left: `a UNION b UNION c` becomes `((a ∪ b) ∪ c)`, and the
    /// union-level order and pagination attach to the outermost node.
    pub(crate) fn lower_query(&self, query: &Query) -> Result<QueryExpression> {
        if query.unions.is_empty() {
            let spec = self.lower_specification(query, true)?;
            return Ok(QueryExpression::Specification(Box::new(spec)));
        }

        let mut expression =
            QueryExpression::Specification(Box::new(self.lower_specification(query, false)?));
        for (index, union) in query.unions.iter().enumerate() {
            trace!(branch = index + 1, all = union.all, "Folding union branch");
            expression = QueryExpression::Union(Box::new(BinaryUnionQueryExpression {
                left: expression,
                right: self.lower_query(&union.query)?,
                all: union.all,
                order_by: None,
                limit: None,
                offset: None,
            }));
        }
        if let QueryExpression::Union(outer) = &mut expression {
            outer.order_by = self.order_by(&query.union_orders)?;
            outer.limit = query.union_limit.map(|count| LimitClause { count });
            outer.offset = query.union_offset.map(|count| OffsetClause { count });
        }

        match &query.aggregate {
            Some(aggregate) => {
                let mut outer = QuerySpecification::new(self.aggregate_list(aggregate, false)?);
                outer.from = Some(FromClause {
                    table: TableReference::Derived(DerivedTable {
                        query: NestedExpression::query(expression),
                        alias: Identifier::new(TEMP_TABLE),
                    }),
                });
                Ok(QueryExpression::Specification(Box::new(outer)))
            }
            None => Ok(expression),
        }
    }

    /// Lowers the clauses of one SELECT. With `with_aggregate`, a requested
    /// aggregate replaces the select list.
    fn lower_specification(&self, query: &Query, with_aggregate: bool) -> Result<QuerySpecification> {
        let aggregate = query.aggregate.as_ref().filter(|_| with_aggregate);
        let select_list = match aggregate {
            Some(aggregate) => self.aggregate_list(aggregate, query.distinct)?,
            None => self.select_list(&query.columns)?,
        };

        let mut spec = QuerySpecification::new(select_list);
        spec.distinct = query.distinct && aggregate.is_none();
        spec.from = self.from_clause(query)?;
        spec.where_clause = self
            .conditions(&query.wheres, BindingType::Where)?
            .map(|condition| WhereClause { condition });
        if !query.groups.is_empty() {
            let expressions = query
                .groups
                .iter()
                .map(|column| self.column_expression(column))
                .collect::<Result<Vec<_>>>()?;
            spec.group_by = Some(GroupByClause { expressions });
        }
        spec.having = self
            .conditions(&query.havings, BindingType::Having)?
            .map(|condition| HavingClause { condition });
        spec.order_by = self.order_by(&query.orders)?;
        spec.limit = query.limit.map(|count| LimitClause { count });
        spec.offset = query.offset.map(|count| OffsetClause { count });
        spec.lock = query.lock.clone().map(|lock| LockClause { lock });
        Ok(spec)
    }

    fn select_list(&self, columns: &[Selection]) -> Result<SelectList> {
        if columns.is_empty() {
            return Ok(SelectList::wildcard());
        }
        let items = columns
            .iter()
            .map(|column| self.select_item(column))
            .collect::<Result<Vec<_>>>()?;
        Ok(SelectList { items })
    }

    fn select_item(&self, selection: &Selection) -> Result<SelectItem> {
        Ok(match selection {
            Selection::Column(fragment) => {
                let column = parse_column(fragment)?;
                let path = self.prefix_qualifier(column.path);
                if path.last().is_some_and(Identifier::is_wildcard) {
                    let qualifier = &path.segments[..path.segments.len() - 1];
                    let qualifier =
                        (!qualifier.is_empty()).then(|| PathExpression::new(qualifier.to_vec()));
                    SelectItem::Wildcard(qualifier)
                } else {
                    SelectItem::Column(ColumnReferenceExpression {
                        path,
                        json: column.json,
                        alias: column.alias,
                    })
                }
            }
            Selection::Raw(fragment) => SelectItem::Expression {
                expression: Expression::Raw(raw_expression(fragment)),
                alias: None,
            },
            Selection::Sub { query, alias } => SelectItem::Expression {
                expression: Expression::Nested(NestedExpression::plan(query.as_ref().clone())),
                alias: Some(Identifier::new(alias.as_str())),
            },
        })
    }

    fn aggregate_list(&self, aggregate: &Aggregate, distinct_query: bool) -> Result<SelectList> {
        let arguments = match &aggregate.column {
            Some(column) => vec![self.column_expression(column)?],
            None => Vec::new(),
        };
        let distinct = aggregate.distinct || (distinct_query && !arguments.is_empty());
        Ok(SelectList {
            items: vec![SelectItem::Expression {
                expression: Expression::Aggregate(AggregateExpression {
                    function: aggregate.function,
                    distinct,
                    arguments,
                }),
                alias: Some(Identifier::new(AGGREGATE_ALIAS)),
            }],
        })
    }

    /// Lowers FROM and the joins hanging off it.
    pub(crate) fn from_clause(&self, query: &Query) -> Result<Option<FromClause>> {
        let Some(source) = &query.from else {
            if query.joins.is_empty() {
                return Ok(None);
            }
            return Err(GrammarError::construction("joins require a FROM table"));
        };
        let table = match source {
            Source::Table(fragment) => TableReference::Table(self.table_name(fragment)?),
            Source::Sub { query, alias } => TableReference::Derived(DerivedTable {
                query: NestedExpression::plan(query.as_ref().clone()),
                alias: self.prefixed(&Identifier::new(alias.as_str())),
            }),
            Source::Raw(fragment) => TableReference::Raw(raw_expression(fragment)),
        };
        if query.joins.is_empty() {
            return Ok(Some(FromClause { table }));
        }
        let joins = query
            .joins
            .iter()
            .map(|join| self.lower_join(join))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(FromClause {
            table: TableReference::Joined(JoinedTable {
                table: Box::new(table),
                joins,
            }),
        }))
    }

    fn lower_join(&self, join: &JoinClause) -> Result<JoinExpression> {
        let target = match &join.target {
            JoinTarget::Table(fragment) => TableReference::Table(self.table_name(fragment)?),
            JoinTarget::Sub { query, alias } => TableReference::Derived(DerivedTable {
                query: NestedExpression::plan(query.as_ref().clone()),
                alias: self.prefixed(&Identifier::new(alias.as_str())),
            }),
        };
        Ok(JoinExpression {
            join_type: join.kind,
            target,
            on: self.conditions(&join.conditions, BindingType::Join)?,
        })
    }

    pub(crate) fn order_by(&self, orders: &[Order]) -> Result<Option<OrderByClause>> {
        if orders.is_empty() {
            return Ok(None);
        }
        let sorts = orders
            .iter()
            .map(|order| {
                Ok(match order {
                    Order::Column { column, direction } => SortSpecification {
                        expression: self.column_expression(column)?,
                        direction: Some(*direction),
                    },
                    Order::Raw(fragment) => SortSpecification {
                        expression: Expression::Raw(raw_expression(fragment)),
                        direction: None,
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(OrderByClause { sorts }))
    }

    /// Lowers `compile_exists`.
    pub(super) fn lower_exists(&self, query: &Query) -> Result<QueryExpression> {
        let exists_alias = Some(Identifier::new(EXISTS_ALIAS));
        let spec = match self.dialect.exists_style() {
            ExistsStyle::SelectExists => {
                let inner = self.lower_query(query)?;
                QuerySpecification::new(SelectList {
                    items: vec![SelectItem::Expression {
                        expression: Expression::Exists(ExistsPredicateExpression {
                            query: NestedExpression::query(inner),
                            not: false,
                        }),
                        alias: exists_alias,
                    }],
                })
            }
            ExistsStyle::TopOne => {
                let one = SelectList {
                    items: vec![SelectItem::Expression {
                        expression: Expression::raw("1"),
                        alias: exists_alias,
                    }],
                };
                let mut spec = if query.unions.is_empty() {
                    let mut spec = self.lower_specification(query, false)?;
                    spec.select_list = one;
                    spec.distinct = false;
                    spec.order_by = None;
                    spec.offset = None;
                    spec
                } else {
                    let mut spec = QuerySpecification::new(one);
                    spec.from = Some(FromClause {
                        table: TableReference::Derived(DerivedTable {
                            query: NestedExpression::query(self.lower_query(query)?),
                            alias: Identifier::new(TEMP_TABLE),
                        }),
                    });
                    spec
                };
                spec.limit = Some(LimitClause { count: 1 });
                spec
            }
        };
        Ok(QueryExpression::Specification(Box::new(spec)))
    }
}
