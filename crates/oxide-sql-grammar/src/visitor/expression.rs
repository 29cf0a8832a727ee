//! Expression and predicate rendering.

use super::{RenderContext, Visitor};
use crate::ast::{
    AggregateExpression, BetweenPredicateExpression, BindingVariable,
    ComparisonPredicateExpression, ConditionExpression, Connective, ExistsPredicateExpression,
    Expression, FunctionExpression, FunctionName, InPredicateExpression, InValues,
    JsonPathExpression, LikePredicateExpression, NestedExpression, NestedSource,
    NullPredicateExpression, PathExpression,
};
use crate::error::{GrammarError, Result};

const fn not_prefix(not: bool) -> &'static str {
    if not {
        "NOT "
    } else {
        ""
    }
}

impl Visitor<'_> {
    pub(crate) fn visit_expression(
        &mut self,
        expression: &Expression,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        match expression {
            Expression::Path(path) => Ok(self.visit_path(path, ctx)),
            Expression::Json(json) => Ok(self.visit_json(json)),
            Expression::Binding(binding) => Ok(self.visit_binding(binding, ctx)),
            Expression::Raw(raw) => Ok(self.visit_raw(raw, ctx)),
            Expression::Nested(nested) => self.visit_nested(nested, ctx),
            Expression::Function(function) => self.visit_function(function, ctx),
            Expression::Aggregate(aggregate) => self.visit_aggregate(aggregate, ctx),
            Expression::Comparison(comparison) => self.visit_comparison(comparison, ctx),
            Expression::Between(between) => self.visit_between(between, ctx),
            Expression::In(predicate) => self.visit_in(predicate, ctx),
            Expression::Null(predicate) => self.visit_null(predicate, ctx),
            Expression::Exists(predicate) => self.visit_exists(predicate, ctx),
            Expression::Like(predicate) => self.visit_like(predicate, ctx),
            Expression::Condition(condition) => self.visit_condition(condition, ctx),
            Expression::Parenthesized(inner) => {
                Ok(format!("({})", self.visit_expression(inner, ctx)?))
            }
        }
    }

    /// Quotes a column path. Inside an UPDATE's SET list the target
    /// qualifier is dropped for single-table statements and added when the
    /// statement has joins.
    pub(crate) fn visit_path(&self, path: &PathExpression, ctx: RenderContext<'_>) -> String {
        match ctx.update {
            Some(scope) if ctx.assignment => {
                if scope.has_joins {
                    self.quote_path(&path.clone().qualify(scope.target))
                } else {
                    path.last()
                        .map_or_else(|| self.quote_path(path), |name| self.quote(name))
                }
            }
            _ => self.quote_path(path),
        }
    }

    fn visit_json(&self, json: &JsonPathExpression) -> String {
        let column = self.quote_path(&json.column);
        self.dialect().json_selector(&column, &json.path)
    }

    fn visit_binding(&mut self, binding: &BindingVariable, ctx: RenderContext<'_>) -> String {
        let purpose = ctx.purpose(binding.purpose);
        String::from(self.bind(binding.value.clone(), purpose))
    }

    pub(crate) fn visit_nested(
        &mut self,
        nested: &NestedExpression,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        Ok(format!("({})", self.visit_nested_inner(nested, ctx)?))
    }

    /// Renders a nested source without the surrounding parentheses.
    ///
    /// A plan is compiled by a fresh visitor; its bindings are spliced in
    /// here, at the position its text is inserted.
    pub(crate) fn visit_nested_inner(
        &mut self,
        nested: &NestedExpression,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        match &nested.source {
            NestedSource::Plan(query) => {
                let compiled = self.grammar.compile_nested(query)?;
                self.bindings
                    .splice(compiled.bindings, ctx.purpose(ctx.clause));
                Ok(compiled.sql)
            }
            NestedSource::Raw(raw) => Ok(self.visit_raw(raw, ctx)),
            NestedSource::Query(query) => self.visit_query_expression(query, ctx),
        }
    }

    fn visit_function(
        &mut self,
        function: &FunctionExpression,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        match &function.name {
            FunctionName::Date(part) => {
                let [argument] = function.arguments.as_slice() else {
                    return Err(GrammarError::UnexpectedNode(format!(
                        "{} expects one argument, got {}",
                        part.as_str(),
                        function.arguments.len()
                    )));
                };
                let operand = self.visit_expression(argument, ctx)?;
                Ok(self.dialect().date_function(*part, &operand))
            }
            FunctionName::JsonLength => match function.arguments.as_slice() {
                [Expression::Path(path)] => {
                    Ok(self.dialect().json_length(&self.quote_path(path), &[]))
                }
                [Expression::Json(json)] => Ok(self
                    .dialect()
                    .json_length(&self.quote_path(&json.column), &json.path)),
                _ => Err(GrammarError::UnexpectedNode(String::from(
                    "JSON length expects a single column argument",
                ))),
            },
        }
    }

    fn visit_aggregate(
        &mut self,
        aggregate: &AggregateExpression,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let arguments = if aggregate.arguments.is_empty() {
            String::from("*")
        } else {
            self.visit_list(&aggregate.arguments, ctx)?
        };
        let distinct = if aggregate.distinct { "DISTINCT " } else { "" };
        Ok(format!(
            "{}({distinct}{arguments})",
            aggregate.function.as_str()
        ))
    }

    fn visit_comparison(
        &mut self,
        comparison: &ComparisonPredicateExpression,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let left = self.visit_expression(&comparison.left, ctx)?;
        let mut right = self.visit_expression(&comparison.right, ctx)?;
        if let Expression::Function(FunctionExpression {
            name: FunctionName::Date(part),
            ..
        }) = comparison.left.as_ref()
        {
            right = self.dialect().date_value(*part, &right);
        }
        Ok(format!("{left} {} {right}", comparison.operator.as_str()))
    }

    fn visit_between(
        &mut self,
        between: &BetweenPredicateExpression,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let operand = self.visit_expression(&between.operand, ctx)?;
        let low = self.visit_expression(&between.low, ctx)?;
        let high = self.visit_expression(&between.high, ctx)?;
        Ok(format!(
            "{operand} {}BETWEEN {low} AND {high}",
            not_prefix(between.not)
        ))
    }

    /// An empty list never matches; negated, it always matches.
    fn visit_in(&mut self, predicate: &InPredicateExpression, ctx: RenderContext<'_>) -> Result<String> {
        if let InValues::List(values) = &predicate.values {
            if values.is_empty() {
                return Ok(String::from(if predicate.not { "1 = 1" } else { "0 = 1" }));
            }
        }
        let operand = self.visit_expression(&predicate.operand, ctx)?;
        let values = match &predicate.values {
            InValues::List(values) => format!("({})", self.visit_list(values, ctx)?),
            InValues::Subquery(nested) => self.visit_nested(nested, ctx)?,
        };
        Ok(format!("{operand} {}IN {values}", not_prefix(predicate.not)))
    }

    fn visit_null(
        &mut self,
        predicate: &NullPredicateExpression,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let operand = self.visit_expression(&predicate.operand, ctx)?;
        Ok(format!("{operand} IS {}NULL", not_prefix(predicate.not)))
    }

    pub(crate) fn visit_exists(
        &mut self,
        predicate: &ExistsPredicateExpression,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let query = self.visit_nested(&predicate.query, ctx)?;
        Ok(format!("{}EXISTS {query}", not_prefix(predicate.not)))
    }

    fn visit_like(
        &mut self,
        predicate: &LikePredicateExpression,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let dialect = self.dialect();
        let operator = dialect
            .like_operator(predicate.case_sensitive)
            .ok_or_else(|| GrammarError::unsupported(dialect.name(), "case-sensitive LIKE"))?;
        let operand = dialect.like_operand(self.visit_expression(&predicate.operand, ctx)?);
        let pattern = self.visit_expression(&predicate.pattern, ctx)?;
        Ok(format!(
            "{operand} {}{operator} {pattern}",
            not_prefix(predicate.not)
        ))
    }

    /// Joins the terms with the node's connective. An `OR` group inside an
    /// `AND` is parenthesized; nothing else needs to be.
    fn visit_condition(
        &mut self,
        condition: &ConditionExpression,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        if condition.terms.is_empty() {
            return Err(GrammarError::UnexpectedNode(String::from(
                "condition without terms",
            )));
        }
        let separator = format!(" {} ", condition.connective.as_str());
        let mut parts = Vec::with_capacity(condition.terms.len());
        for term in &condition.terms {
            let sql = self.visit_expression(term, ctx)?;
            let needs_parens = condition.connective == Connective::And
                && matches!(
                    term,
                    Expression::Condition(ConditionExpression {
                        connective: Connective::Or,
                        ..
                    })
                );
            parts.push(if needs_parens { format!("({sql})") } else { sql });
        }
        Ok(parts.join(&separator))
    }

    pub(crate) fn visit_list(
        &mut self,
        expressions: &[Expression],
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let mut parts = Vec::with_capacity(expressions.len());
        for expression in expressions {
            parts.push(self.visit_expression(expression, ctx)?);
        }
        Ok(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ComparisonOperator, DatePart};
    use crate::binding::BindingType;
    use crate::dialect::{PostgresDialect, SqliteDialect};
    use crate::grammar::Grammar;
    use crate::value::SqlValue;

    fn render(grammar: &Grammar<'_>, expression: &Expression) -> (String, usize) {
        let mut visitor = Visitor::new(grammar);
        let sql = visitor
            .visit_expression(expression, RenderContext::root())
            .unwrap();
        (sql, visitor.bindings.len())
    }

    fn column(name: &str) -> Expression {
        Expression::Path(PathExpression::single(name))
    }

    fn value(v: i64) -> Expression {
        Expression::binding(SqlValue::Int(v), BindingType::Where)
    }

    #[test]
    fn test_empty_in_lists() {
        let dialect = PostgresDialect::new();
        let grammar = Grammar::new(&dialect);
        let empty_in = column("id").in_values(InValues::List(vec![]), false);
        let empty_not_in = column("id").in_values(InValues::List(vec![]), true);
        assert_eq!(render(&grammar, &empty_in), (String::from("0 = 1"), 0));
        assert_eq!(render(&grammar, &empty_not_in), (String::from("1 = 1"), 0));
    }

    #[test]
    fn test_or_inside_and_is_parenthesized() {
        let dialect = PostgresDialect::new();
        let grammar = Grammar::new(&dialect);
        let either = Expression::Condition(ConditionExpression {
            connective: Connective::Or,
            terms: vec![
                column("a").compare(ComparisonOperator::Eq, value(1)),
                column("b").compare(ComparisonOperator::Eq, value(2)),
            ],
        });
        let both = Expression::Condition(ConditionExpression {
            connective: Connective::And,
            terms: vec![column("c").compare(ComparisonOperator::Gt, value(3)), either],
        });
        assert_eq!(
            render(&grammar, &both),
            (String::from("\"c\" > ? AND (\"a\" = ? OR \"b\" = ?)"), 3)
        );
    }

    #[test]
    fn test_date_comparison_wraps_value() {
        let dialect = SqliteDialect::new();
        let grammar = Grammar::new(&dialect);
        let year = Expression::Function(FunctionExpression {
            name: FunctionName::Date(DatePart::Year),
            arguments: vec![column("created_at")],
        })
        .compare(ComparisonOperator::Eq, value(2024));
        assert_eq!(
            render(&grammar, &year).0,
            "strftime('%Y', \"created_at\") = cast(? as text)"
        );
    }

    #[test]
    fn test_case_sensitive_like_is_unsupported_on_sqlite() {
        let dialect = SqliteDialect::new();
        let grammar = Grammar::new(&dialect);
        let like = Expression::Like(LikePredicateExpression {
            operand: Box::new(column("name")),
            pattern: Box::new(value(1)),
            case_sensitive: true,
            not: false,
        });
        let mut visitor = Visitor::new(&grammar);
        let err = visitor
            .visit_expression(&like, RenderContext::root())
            .unwrap_err();
        assert!(matches!(err, GrammarError::UnsupportedOperation { dialect: "sqlite", .. }));
    }

    #[test]
    fn test_json_length_rejects_non_columns() {
        let dialect = PostgresDialect::new();
        let grammar = Grammar::new(&dialect);
        let length = Expression::Function(FunctionExpression {
            name: FunctionName::JsonLength,
            arguments: vec![value(1)],
        });
        let mut visitor = Visitor::new(&grammar);
        assert!(matches!(
            visitor.visit_expression(&length, RenderContext::root()),
            Err(GrammarError::UnexpectedNode(_))
        ));
    }
}
