//! AST rendering.
//!
//! The [`Visitor`] walks a [`Statement`] once, left to right, producing SQL
//! text and appending one binding per emitted placeholder. Per-call state
//! (current clause, join/update scope, binding override) travels in an
//! immutable [`RenderContext`] passed down the recursion, so a visitor
//! holds nothing but its output bindings.

mod expression;
mod statement;

pub(crate) use statement::TEMP_TABLE;

use crate::ast::{Identifier, PathExpression, RawExpression, Statement, TableName};
use crate::binding::{BindingType, Bindings};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::grammar::Grammar;
use crate::value::SqlValue;

/// The UPDATE being rendered.
#[derive(Debug, Clone, Copy)]
pub(crate) struct UpdateScope<'n> {
    /// Whether the statement joins other tables.
    pub has_joins: bool,
    /// The name assignment columns are qualified with.
    pub target: &'n Identifier,
}

/// Rendering state for one position in the tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RenderContext<'n> {
    clause: BindingType,
    in_join: bool,
    binding_override: Option<BindingType>,
    update: Option<UpdateScope<'n>>,
    assignment: bool,
}

impl<'n> RenderContext<'n> {
    pub(crate) const fn root() -> Self {
        Self {
            clause: BindingType::Where,
            in_join: false,
            binding_override: None,
            update: None,
            assignment: false,
        }
    }

    pub(crate) const fn in_clause(mut self, clause: BindingType) -> Self {
        self.clause = clause;
        self
    }

    pub(crate) const fn joining(mut self) -> Self {
        self.in_join = true;
        self
    }

    pub(crate) const fn overriding(mut self, purpose: BindingType) -> Self {
        self.binding_override = Some(purpose);
        self
    }

    pub(crate) const fn updating(mut self, scope: UpdateScope<'n>) -> Self {
        self.update = Some(scope);
        self
    }

    pub(crate) const fn assigning(mut self) -> Self {
        self.assignment = true;
        self
    }

    /// The bucket for a value tagged `own`: an explicit override wins, then
    /// the join scope, then the tag itself.
    pub(crate) const fn purpose(&self, own: BindingType) -> BindingType {
        match self.binding_override {
            Some(purpose) => purpose,
            None if self.in_join => BindingType::Join,
            None => own,
        }
    }
}

/// Renders statements for one grammar.
pub struct Visitor<'g> {
    grammar: &'g Grammar<'g>,
    bindings: Bindings,
}

impl<'g> Visitor<'g> {
    /// Creates a visitor with no bindings.
    #[must_use]
    pub const fn new(grammar: &'g Grammar<'g>) -> Self {
        Self {
            grammar,
            bindings: Bindings::new(),
        }
    }

    /// Renders a statement, returning the text and its bindings in
    /// placeholder order.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree contains a node the active dialect
    /// cannot express.
    pub fn render(mut self, statement: &Statement) -> Result<(String, Bindings)> {
        let ctx = RenderContext::root();
        let sql = match statement {
            Statement::Query(query) => self.visit_query_expression(query, ctx)?,
            Statement::Insert(insert) => self.visit_insert(insert, ctx)?,
            Statement::Update(update) => self.visit_update(update, ctx)?,
            Statement::Delete(delete) => self.visit_delete(delete, ctx)?,
            Statement::Truncate(truncate) => self.visit_truncate(truncate)?,
        };
        Ok((sql, self.bindings))
    }

    fn dialect(&self) -> &'g dyn Dialect {
        self.grammar.dialect()
    }

    /// Registers a value and returns its placeholder.
    fn bind(&mut self, value: SqlValue, purpose: BindingType) -> &'static str {
        self.bindings.push(value, purpose);
        self.dialect().parameter_placeholder()
    }

    fn visit_raw(&mut self, raw: &RawExpression, ctx: RenderContext<'_>) -> String {
        let purpose = ctx.purpose(ctx.clause);
        for value in &raw.bindings {
            self.bindings.push(value.clone(), purpose);
        }
        raw.sql.clone()
    }

    fn quote(&self, identifier: &Identifier) -> String {
        self.dialect().quote_identifier(identifier.as_str())
    }

    fn quote_path(&self, path: &PathExpression) -> String {
        self.grammar.quote_path(path)
    }

    fn quote_table(&self, table: &TableName) -> String {
        let mut sql = self.quote_path(&table.path);
        if let Some(alias) = &table.alias {
            sql.push_str(" AS ");
            sql.push_str(&self.quote(alias));
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ComparisonOperator, Expression, QueryExpression};
    use crate::dialect::{MySqlDialect, SqlServerDialect};
    use crate::plan::{Filterable, Query};

    #[test]
    fn test_context_purpose_precedence() {
        let ctx = RenderContext::root();
        assert_eq!(ctx.purpose(BindingType::Where), BindingType::Where);
        assert_eq!(ctx.joining().purpose(BindingType::Where), BindingType::Join);
        assert_eq!(
            ctx.joining()
                .overriding(BindingType::UpdateJoin)
                .purpose(BindingType::Where),
            BindingType::UpdateJoin
        );
    }

    #[test]
    fn test_render_lowered_query() {
        let dialect = MySqlDialect::new();
        let grammar = Grammar::new(&dialect);
        let query = grammar
            .lower_query(&Query::table("users").where_eq("id", 7))
            .unwrap();
        let (sql, bindings) = Visitor::new(&grammar)
            .render(&Statement::Query(query))
            .unwrap();
        assert_eq!(sql, "SELECT * FROM `users` WHERE `id` = ?");
        assert_eq!(bindings.values(), vec![SqlValue::Int(7)]);
    }

    #[test]
    fn test_render_hand_built_condition() {
        let dialect = SqlServerDialect::new();
        let grammar = Grammar::new(&dialect);
        let mut spec = crate::ast::QuerySpecification::new(crate::ast::SelectList::wildcard());
        spec.where_clause = Some(crate::ast::WhereClause {
            condition: Expression::Path(PathExpression::single("a")).compare(
                ComparisonOperator::LtEq,
                Expression::binding(SqlValue::Int(1), BindingType::Where),
            ),
        });
        let statement = Statement::Query(QueryExpression::Specification(Box::new(spec)));
        let (sql, bindings) = Visitor::new(&grammar).render(&statement).unwrap();
        assert_eq!(sql, "SELECT * WHERE [a] <= ?");
        assert_eq!(bindings.len(), 1);
    }
}
