//! Lowering of filter records, operands and column fragments.

use super::Grammar;
use crate::ast::{
    BetweenPredicateExpression, ComparisonOperator, ConditionExpression, Connective,
    ExistsPredicateExpression, Expression, FunctionExpression, FunctionName, InValues,
    JsonPathExpression, LikePredicateExpression, NestedExpression, NullPredicateExpression,
    RawExpression,
};
use crate::binding::BindingType;
use crate::error::{GrammarError, Result};
use crate::fragment::parse_column;
use crate::plan::{Operand, RawFragment, Where, WhereKind};
use crate::value::SqlValue;

impl Grammar<'_> {
    /// Lowers a filter list into one condition.
    ///
    /// Consecutive `AND` filters form a group; groups are joined with `OR`.
    /// The connective of the first filter is ignored. Returns `None` when
    /// nothing is left to render.
    pub(crate) fn conditions(
        &self,
        filters: &[Where],
        purpose: BindingType,
    ) -> Result<Option<Expression>> {
        let mut groups: Vec<Vec<Expression>> = Vec::new();
        for filter in filters {
            let Some(expression) = self.lower_where(&filter.kind, purpose)? else {
                continue;
            };
            match (filter.boolean, groups.last_mut()) {
                (Connective::And, Some(group)) => group.push(expression),
                _ => groups.push(vec![expression]),
            }
        }

        let mut alternatives: Vec<Expression> = groups
            .into_iter()
            .filter_map(|mut terms| {
                if terms.len() == 1 {
                    terms.pop()
                } else {
                    Some(Expression::Condition(ConditionExpression {
                        connective: Connective::And,
                        terms,
                    }))
                }
            })
            .collect();

        Ok(match alternatives.len() {
            0 => None,
            1 => alternatives.pop(),
            _ => Some(Expression::Condition(ConditionExpression {
                connective: Connective::Or,
                terms: alternatives,
            })),
        })
    }

    fn lower_where(&self, kind: &WhereKind, purpose: BindingType) -> Result<Option<Expression>> {
        let expression = match kind {
            WhereKind::Basic {
                column,
                operator,
                value,
            } => {
                let left = self.column_expression(column)?;
                match (operator, value) {
                    (
                        ComparisonOperator::Eq | ComparisonOperator::NotEq,
                        Operand::Value(SqlValue::Null),
                    ) => Expression::Null(NullPredicateExpression {
                        operand: Box::new(left),
                        not: *operator == ComparisonOperator::NotEq,
                    }),
                    _ => left.compare(*operator, self.operand(value, purpose)?),
                }
            }
            WhereKind::In { column, values, not } => {
                let values = values
                    .iter()
                    .map(|value| Expression::binding(value.clone(), purpose))
                    .collect();
                self.column_expression(column)?
                    .in_values(InValues::List(values), *not)
            }
            WhereKind::InSub { column, query, not } => self
                .column_expression(column)?
                .in_values(
                    InValues::Subquery(NestedExpression::plan(query.as_ref().clone())),
                    *not,
                ),
            WhereKind::Null { column, not } => Expression::Null(NullPredicateExpression {
                operand: Box::new(self.column_expression(column)?),
                not: *not,
            }),
            WhereKind::Between {
                column,
                low,
                high,
                not,
            } => Expression::Between(BetweenPredicateExpression {
                operand: Box::new(self.column_expression(column)?),
                low: Box::new(self.operand(low, purpose)?),
                high: Box::new(self.operand(high, purpose)?),
                not: *not,
            }),
            WhereKind::Exists { query, not } => Expression::Exists(ExistsPredicateExpression {
                query: NestedExpression::plan(query.as_ref().clone()),
                not: *not,
            }),
            WhereKind::Nested(filters) => match self.conditions(filters, purpose)? {
                Some(inner) => Expression::Parenthesized(Box::new(inner)),
                None => return Ok(None),
            },
            WhereKind::Raw(fragment) => Expression::Raw(raw_expression(fragment)),
            WhereKind::Date {
                column,
                part,
                operator,
                value,
            } => Expression::Function(FunctionExpression {
                name: FunctionName::Date(*part),
                arguments: vec![self.column_expression(column)?],
            })
            .compare(*operator, Expression::binding(value.clone(), purpose)),
            WhereKind::JsonLength {
                column,
                operator,
                value,
            } => Expression::Function(FunctionExpression {
                name: FunctionName::JsonLength,
                arguments: vec![self.column_expression(column)?],
            })
            .compare(*operator, Expression::binding(value.clone(), purpose)),
            WhereKind::Like {
                column,
                pattern,
                case_sensitive,
                not,
            } => Expression::Like(LikePredicateExpression {
                operand: Box::new(self.column_expression(column)?),
                pattern: Box::new(Expression::binding(pattern.clone(), purpose)),
                case_sensitive: *case_sensitive,
                not: *not,
            }),
        };
        Ok(Some(expression))
    }

    /// Lowers a column fragment used inside an expression. Aliases and
    /// wildcards are only valid in a select list.
    pub(crate) fn column_expression(&self, fragment: &str) -> Result<Expression> {
        let column = parse_column(fragment)?;
        if column.alias.is_some() {
            return Err(GrammarError::construction(format!(
                "column `{fragment}` cannot carry an alias here"
            )));
        }
        if column.path.last().is_some_and(|name| name.is_wildcard()) {
            return Err(GrammarError::construction(format!(
                "wildcard `{fragment}` is only valid in a select list"
            )));
        }
        let path = self.prefix_qualifier(column.path);
        if column.json.is_empty() {
            Ok(Expression::Path(path))
        } else {
            Ok(Expression::Json(JsonPathExpression {
                column: path,
                path: column.json,
            }))
        }
    }

    /// Lowers an operand. Values become bindings tagged with `purpose`.
    pub(crate) fn operand(&self, operand: &Operand, purpose: BindingType) -> Result<Expression> {
        Ok(match operand {
            Operand::Value(value) => Expression::binding(value.clone(), purpose),
            Operand::Column(column) => self.column_expression(column)?,
            Operand::Raw(fragment) => Expression::Raw(raw_expression(fragment)),
            Operand::Sub(query) => Expression::Nested(NestedExpression::plan(query.as_ref().clone())),
        })
    }
}

pub(crate) fn raw_expression(fragment: &RawFragment) -> RawExpression {
    RawExpression {
        sql: fragment.sql.clone(),
        bindings: fragment.bindings.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::MySqlDialect;
    use crate::plan::{Filterable, Query};

    fn lower(query: &Query) -> Option<Expression> {
        let dialect = MySqlDialect::new();
        Grammar::new(&dialect)
            .conditions(&query.wheres, BindingType::Where)
            .unwrap()
    }

    #[test]
    fn test_and_runs_grouped_under_or() {
        let query = Query::table("t")
            .where_eq("a", 1)
            .where_eq("b", 2)
            .or_where_eq("c", 3);
        let Some(Expression::Condition(top)) = lower(&query) else {
            panic!("expected a condition");
        };
        assert_eq!(top.connective, Connective::Or);
        assert_eq!(top.terms.len(), 2);
        assert!(matches!(
            &top.terms[0],
            Expression::Condition(ConditionExpression {
                connective: Connective::And,
                terms,
            }) if terms.len() == 2
        ));
    }

    #[test]
    fn test_empty_nested_group_is_skipped() {
        let query = Query::table("t").where_nested(|q| q).where_eq("a", 1);
        assert!(matches!(lower(&query), Some(Expression::Comparison(_))));
        assert!(lower(&Query::table("t").where_nested(|q| q)).is_none());
    }

    #[test]
    fn test_null_comparison_becomes_null_predicate() {
        let query = Query::table("t").where_cmp("a", ComparisonOperator::NotEq, SqlValue::Null);
        assert!(matches!(
            lower(&query),
            Some(Expression::Null(NullPredicateExpression { not: true, .. }))
        ));
    }

    #[test]
    fn test_column_expression_rejects_alias_and_wildcard() {
        let dialect = MySqlDialect::new();
        let grammar = Grammar::new(&dialect);
        assert!(grammar.column_expression("a as b").is_err());
        assert!(grammar.column_expression("users.*").is_err());
        assert!(matches!(
            grammar.column_expression("meta->tags->0").unwrap(),
            Expression::Json(_)
        ));
    }
}
