//! Statement and clause rendering.

use super::{RenderContext, UpdateScope, Visitor};
use crate::ast::{
    BinaryUnionQueryExpression, ConflictClause, DeleteSpecification, Expression, Identifier,
    InsertSource, InsertSpecification, JoinExpression, LimitClause, LockClause, OffsetClause,
    OrderByClause, QueryExpression, QuerySpecification, SelectItem, SelectList,
    TableReference, TruncateSpecification, UpdateSpecification, UpsertClause,
};
use crate::binding::BindingType;
use crate::dialect::{
    InsertIgnoreStyle, LockPlacement, Pagination, TruncateStyle, UpsertStyle,
};
use crate::error::{GrammarError, Result};
use crate::plan::Lock;

/// Alias of the derived table unions and union aggregates select from.
pub(crate) const TEMP_TABLE: &str = "temp_table";

/// Source alias of a MERGE upsert.
const MERGE_SOURCE: &str = "oxide_source";

impl Visitor<'_> {
    pub(crate) fn visit_query_expression(
        &mut self,
        query: &QueryExpression,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        match query {
            QueryExpression::Specification(spec) => self.visit_query_specification(spec, ctx),
            QueryExpression::Union(union) => self.visit_union(union, ctx),
        }
    }

    fn visit_query_specification(
        &mut self,
        spec: &QuerySpecification,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let dialect = self.dialect();
        let mut sql = String::from("SELECT ");
        if spec.distinct {
            sql.push_str("DISTINCT ");
        }
        if dialect.pagination() == Pagination::Top {
            if let Some(limit) = spec.limit {
                sql.push_str(&format!("TOP {} ", limit.count));
            }
        }
        sql.push_str(&self.visit_select_list(&spec.select_list, ctx.in_clause(BindingType::Select))?);

        let hint = match (&spec.lock, dialect.lock_placement()) {
            (Some(lock), LockPlacement::TableHint) => self.lock_sql(lock)?,
            _ => None,
        };
        if let Some(from) = &spec.from {
            sql.push_str(" FROM ");
            sql.push_str(&self.visit_table_reference(
                &from.table,
                hint.as_deref(),
                ctx.in_clause(BindingType::From),
            )?);
        }
        if let Some(clause) = &spec.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&self.visit_expression(&clause.condition, ctx.in_clause(BindingType::Where))?);
        }
        if let Some(group_by) = &spec.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.visit_list(&group_by.expressions, ctx.in_clause(BindingType::GroupBy))?);
        }
        if let Some(having) = &spec.having {
            sql.push_str(" HAVING ");
            sql.push_str(&self.visit_expression(&having.condition, ctx.in_clause(BindingType::Having))?);
        }
        if let Some(order_by) = &spec.order_by {
            sql.push_str(&self.visit_order_by(order_by, ctx.in_clause(BindingType::Order))?);
        }
        match dialect.pagination() {
            Pagination::LimitOffset => {
                sql.push_str(&self.limit_offset(spec.limit, spec.offset));
            }
            Pagination::Top => {
                if let Some(offset) = spec.offset {
                    if spec.order_by.is_none() {
                        sql.push_str(" ORDER BY (SELECT 0)");
                    }
                    sql.push_str(&format!(" OFFSET {} ROWS", offset.count));
                }
            }
        }
        if let (Some(lock), LockPlacement::Suffix) = (&spec.lock, dialect.lock_placement()) {
            if let Some(lock) = self.lock_sql(lock)? {
                sql.push(' ');
                sql.push_str(&lock);
            }
        }
        Ok(sql)
    }

    fn visit_select_list(&mut self, list: &SelectList, ctx: RenderContext<'_>) -> Result<String> {
        let mut items = Vec::with_capacity(list.items.len());
        for item in &list.items {
            let sql = match item {
                SelectItem::Wildcard(None) => String::from("*"),
                SelectItem::Wildcard(Some(qualifier)) => format!("{}.*", self.quote_path(qualifier)),
                SelectItem::Column(column) => {
                    let mut sql = self.quote_path(&column.path);
                    if !column.json.is_empty() {
                        sql = self.dialect().json_selector(&sql, &column.json);
                    }
                    self.with_alias(sql, column.alias.as_ref())
                }
                SelectItem::Expression { expression, alias } => {
                    let mut sql = self.visit_expression(expression, ctx)?;
                    if matches!(
                        expression,
                        Expression::Comparison(_)
                            | Expression::Between(_)
                            | Expression::In(_)
                            | Expression::Null(_)
                            | Expression::Like(_)
                            | Expression::Condition(_)
                    ) {
                        sql = format!("({sql})");
                    }
                    self.with_alias(sql, alias.as_ref())
                }
            };
            items.push(sql);
        }
        Ok(items.join(", "))
    }

    fn with_alias(&self, mut sql: String, alias: Option<&Identifier>) -> String {
        if let Some(alias) = alias {
            sql.push_str(" AS ");
            sql.push_str(&self.quote(alias));
        }
        sql
    }

    /// Renders a FROM/UPDATE/DELETE table reference. `hint` follows the
    /// first plain table, and any other first source rejects it.
    fn visit_table_reference(
        &mut self,
        table: &TableReference,
        hint: Option<&str>,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        match table {
            TableReference::Table(name) => {
                let mut sql = self.quote_table(name);
                if let Some(hint) = hint {
                    sql.push(' ');
                    sql.push_str(hint);
                }
                Ok(sql)
            }
            TableReference::Derived(_) | TableReference::Raw(_) if hint.is_some() => {
                Err(GrammarError::UnexpectedNode(String::from(
                    "lock hint on a source that is not a table",
                )))
            }
            TableReference::Derived(derived) => {
                let sql = self.visit_nested(&derived.query, ctx)?;
                Ok(format!("{sql} AS {}", self.quote(&derived.alias)))
            }
            TableReference::Joined(joined) => {
                let mut sql = self.visit_table_reference(&joined.table, hint, ctx)?;
                for join in &joined.joins {
                    sql.push(' ');
                    sql.push_str(&self.visit_join(join, ctx)?);
                }
                Ok(sql)
            }
            TableReference::Raw(raw) => Ok(self.visit_raw(raw, ctx)),
        }
    }

    fn visit_join(&mut self, join: &JoinExpression, ctx: RenderContext<'_>) -> Result<String> {
        let mut ctx = ctx.in_clause(BindingType::Join).joining();
        if ctx.update.is_some() {
            ctx = ctx.overriding(BindingType::UpdateJoin);
        }
        let target = self.visit_table_reference(&join.target, None, ctx)?;
        let mut sql = format!("{} {target}", join.join_type.as_str());
        if let Some(on) = &join.on {
            sql.push_str(" ON ");
            sql.push_str(&self.visit_expression(on, ctx)?);
        }
        Ok(sql)
    }

    fn visit_order_by(&mut self, order_by: &OrderByClause, ctx: RenderContext<'_>) -> Result<String> {
        let mut sorts = Vec::with_capacity(order_by.sorts.len());
        for sort in &order_by.sorts {
            let mut sql = self.visit_expression(&sort.expression, ctx)?;
            if let Some(direction) = sort.direction {
                sql.push(' ');
                sql.push_str(direction.as_str());
            }
            sorts.push(sql);
        }
        Ok(format!(" ORDER BY {}", sorts.join(", ")))
    }

    fn limit_offset(&self, limit: Option<LimitClause>, offset: Option<OffsetClause>) -> String {
        let mut sql = String::new();
        match (limit, offset) {
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {}", limit.count)),
            (None, Some(_)) => {
                if let Some(unbounded) = self.dialect().unbounded_limit() {
                    sql.push_str(&format!(" LIMIT {unbounded}"));
                }
            }
            (None, None) => {}
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {}", offset.count));
        }
        sql
    }

    /// Returns the lock text for this dialect, failing on an empty raw lock.
    fn lock_sql(&self, lock: &LockClause) -> Result<Option<String>> {
        if let Lock::Raw(raw) = &lock.lock {
            if raw.trim().is_empty() {
                return Err(GrammarError::UnexpectedNode(String::from(
                    "empty raw lock clause",
                )));
            }
        }
        Ok(self.dialect().lock_sql(&lock.lock))
    }

    fn visit_union(
        &mut self,
        union: &BinaryUnionQueryExpression,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let left = self.visit_union_branch(&union.left, true, ctx)?;
        let right =
            self.visit_union_branch(&union.right, false, ctx.overriding(BindingType::Union))?;
        let operator = if union.all { "UNION ALL" } else { "UNION" };
        let mut sql = format!("{left} {operator} {right}");

        if let Some(order_by) = &union.order_by {
            sql.push_str(&self.visit_order_by(order_by, ctx.in_clause(BindingType::UnionOrder))?);
        }
        match self.dialect().pagination() {
            Pagination::LimitOffset => sql.push_str(&self.limit_offset(union.limit, union.offset)),
            Pagination::Top => {
                if union.limit.is_some() || union.offset.is_some() {
                    if union.order_by.is_none() {
                        sql.push_str(" ORDER BY (SELECT 0)");
                    }
                    let offset = union.offset.map_or(0, |o| o.count);
                    sql.push_str(&format!(" OFFSET {offset} ROWS"));
                    if let Some(limit) = union.limit {
                        sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", limit.count));
                    }
                }
            }
        }
        Ok(sql)
    }

    /// The folded left side of a union renders bare. Every other branch is
    /// parenthesized, or wrapped as a derived table on engines that reject
    /// ORDER BY in a union member.
    fn visit_union_branch(
        &mut self,
        branch: &QueryExpression,
        is_left: bool,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let sql = self.visit_query_expression(branch, ctx)?;
        if is_left && matches!(branch, QueryExpression::Union(_)) {
            return Ok(sql);
        }
        if self.dialect().wraps_union_branches() {
            Ok(format!(
                "SELECT * FROM ({sql}) AS {}",
                self.quote(&Identifier::new(TEMP_TABLE))
            ))
        } else {
            Ok(format!("({sql})"))
        }
    }

    pub(crate) fn visit_insert(
        &mut self,
        insert: &InsertSpecification,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let dialect = self.dialect();
        if let Some(ConflictClause::Update(upsert)) = &insert.conflict {
            if dialect.upsert_style() == UpsertStyle::Merge {
                return self.visit_merge(insert, upsert, ctx);
            }
        }
        let ctx = ctx.in_clause(BindingType::Insert);
        let ignore = matches!(insert.conflict, Some(ConflictClause::Ignore));
        let keyword = match (ignore, dialect.insert_ignore_style()) {
            (true, InsertIgnoreStyle::Prefix(keyword)) => keyword,
            (true, InsertIgnoreStyle::Unsupported) => {
                return Err(GrammarError::unsupported(dialect.name(), "insert or ignore"));
            }
            _ => "INSERT INTO",
        };
        let mut sql = format!("{keyword} {}", self.quote_table(&insert.table));
        if !insert.columns.is_empty() {
            sql.push_str(&format!(" ({})", self.quote_columns(&insert.columns)));
        }
        match &insert.source {
            InsertSource::DefaultValues => {
                sql.push(' ');
                sql.push_str(dialect.empty_insert_values());
            }
            InsertSource::Values(rows) => {
                sql.push_str(" VALUES ");
                sql.push_str(&self.visit_rows(rows, ctx)?);
            }
            InsertSource::Query(query) => {
                sql.push(' ');
                sql.push_str(&self.visit_nested_inner(query, ctx)?);
            }
        }
        match &insert.conflict {
            Some(ConflictClause::Ignore) => {
                if dialect.insert_ignore_style() == InsertIgnoreStyle::OnConflictDoNothing {
                    sql.push_str(" ON CONFLICT DO NOTHING");
                }
            }
            Some(ConflictClause::Update(upsert)) => sql.push_str(&self.upsert_suffix(upsert)?),
            None => {}
        }
        if let Some(returning) = &insert.returning {
            sql.push_str(" RETURNING ");
            sql.push_str(&self.quote(&returning.column));
        }
        Ok(sql)
    }

    fn visit_rows(&mut self, rows: &[Vec<Expression>], ctx: RenderContext<'_>) -> Result<String> {
        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            tuples.push(format!("({})", self.visit_list(row, ctx)?));
        }
        Ok(tuples.join(", "))
    }

    fn quote_columns(&self, columns: &[Identifier]) -> String {
        columns
            .iter()
            .map(|c| self.quote(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn upsert_suffix(&self, upsert: &UpsertClause) -> Result<String> {
        let dialect = self.dialect();
        match dialect.upsert_style() {
            UpsertStyle::OnDuplicateKey => {
                let updates: Vec<String> = upsert
                    .update
                    .iter()
                    .map(|c| {
                        let column = self.quote(c);
                        format!("{column} = VALUES({column})")
                    })
                    .collect();
                Ok(format!(" ON DUPLICATE KEY UPDATE {}", updates.join(", ")))
            }
            UpsertStyle::OnConflict => {
                let excluded = self.quote(&Identifier::new("excluded"));
                let updates: Vec<String> = upsert
                    .update
                    .iter()
                    .map(|c| {
                        let column = self.quote(c);
                        format!("{column} = {excluded}.{column}")
                    })
                    .collect();
                Ok(format!(
                    " ON CONFLICT ({}) DO UPDATE SET {}",
                    self.quote_columns(&upsert.unique_by),
                    updates.join(", ")
                ))
            }
            UpsertStyle::Merge | UpsertStyle::Unsupported => {
                Err(GrammarError::unsupported(dialect.name(), "upsert"))
            }
        }
    }

    /// `MERGE t USING (VALUES …) AS source (cols) ON … WHEN MATCHED …`
    fn visit_merge(
        &mut self,
        insert: &InsertSpecification,
        upsert: &UpsertClause,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let InsertSource::Values(rows) = &insert.source else {
            return Err(GrammarError::construction("upsert requires at least one row of values"));
        };
        let table = self.quote_table(&insert.table);
        let source = self.quote(&Identifier::new(MERGE_SOURCE));
        let columns = self.quote_columns(&insert.columns);
        let values = self.visit_rows(rows, ctx.in_clause(BindingType::Insert))?;

        let on: Vec<String> = upsert
            .unique_by
            .iter()
            .map(|c| {
                let column = self.quote(c);
                format!("{source}.{column} = {table}.{column}")
            })
            .collect();
        let mut sql = format!(
            "MERGE {table} USING (VALUES {values}) AS {source} ({columns}) ON {}",
            on.join(" AND ")
        );
        let updates: Vec<String> = upsert
            .update
            .iter()
            .map(|c| {
                let column = self.quote(c);
                format!("{column} = {source}.{column}")
            })
            .collect();
        sql.push_str(&format!(" WHEN MATCHED THEN UPDATE SET {}", updates.join(", ")));
        let inserted: Vec<String> = insert
            .columns
            .iter()
            .map(|c| format!("{source}.{}", self.quote(c)))
            .collect();
        sql.push_str(&format!(
            " WHEN NOT MATCHED THEN INSERT ({columns}) VALUES ({});",
            inserted.join(", ")
        ));
        Ok(sql)
    }

    pub(crate) fn visit_update(
        &mut self,
        update: &UpdateSpecification,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let target = update_target(&update.table)?;
        let ctx = ctx.updating(UpdateScope {
            has_joins: update.has_joins,
            target: &target,
        });
        let top = self.dialect().pagination() == Pagination::Top;

        let mut sql = String::from("UPDATE ");
        if let (true, Some(limit)) = (top, update.limit) {
            sql.push_str(&format!("TOP ({}) ", limit.count));
        }
        sql.push_str(&self.visit_table_reference(&update.table, None, ctx.in_clause(BindingType::Update))?);

        let mut assignments = Vec::with_capacity(update.assignments.len());
        for assignment in &update.assignments {
            let column = self.visit_path(&assignment.column, ctx.assigning());
            let value = self.visit_expression(&assignment.value, ctx.in_clause(BindingType::Update))?;
            assignments.push(format!("{column} = {value}"));
        }
        sql.push_str(" SET ");
        sql.push_str(&assignments.join(", "));

        if let Some(from) = &update.from {
            sql.push_str(" FROM ");
            sql.push_str(&self.visit_table_reference(&from.table, None, ctx.in_clause(BindingType::From))?);
        }
        if let Some(clause) = &update.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&self.visit_expression(&clause.condition, ctx.in_clause(BindingType::Where))?);
        }
        if !top {
            if let Some(order_by) = &update.order_by {
                sql.push_str(&self.visit_order_by(order_by, ctx.in_clause(BindingType::Order))?);
            }
            sql.push_str(&self.limit_offset(update.limit, None));
        }
        Ok(sql)
    }

    pub(crate) fn visit_delete(
        &mut self,
        delete: &DeleteSpecification,
        ctx: RenderContext<'_>,
    ) -> Result<String> {
        let top = self.dialect().pagination() == Pagination::Top;
        let mut sql = String::from("DELETE ");
        if let (true, Some(limit)) = (top, delete.limit) {
            sql.push_str(&format!("TOP ({}) ", limit.count));
        }
        if let Some(target) = &delete.target {
            sql.push_str(&self.quote(target));
            sql.push(' ');
        }
        sql.push_str("FROM ");
        sql.push_str(&self.visit_table_reference(&delete.from.table, None, ctx.in_clause(BindingType::From))?);
        if let Some(clause) = &delete.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&self.visit_expression(&clause.condition, ctx.in_clause(BindingType::Where))?);
        }
        if !top {
            if let Some(order_by) = &delete.order_by {
                sql.push_str(&self.visit_order_by(order_by, ctx.in_clause(BindingType::Order))?);
            }
            sql.push_str(&self.limit_offset(delete.limit, None));
        }
        Ok(sql)
    }

    pub(crate) fn visit_truncate(&self, truncate: &TruncateSpecification) -> Result<String> {
        let dialect = self.dialect();
        let table = self.quote_table(&truncate.table);
        match dialect.truncate_style() {
            TruncateStyle::TruncateTable => Ok(format!("TRUNCATE TABLE {table}")),
            TruncateStyle::RestartIdentity => Ok(format!("TRUNCATE {table} RESTART IDENTITY CASCADE")),
            TruncateStyle::SequenceReset { .. } => Err(GrammarError::UnexpectedNode(format!(
                "{} emulates TRUNCATE with DELETE statements",
                dialect.name()
            ))),
        }
    }
}

/// The name SET columns are qualified with: the alias or bare name of the
/// updated table.
fn update_target(table: &TableReference) -> Result<Identifier> {
    match table {
        TableReference::Table(name) => Ok(name.reference_name()),
        TableReference::Joined(joined) => update_target(&joined.table),
        TableReference::Derived(_) | TableReference::Raw(_) => Err(GrammarError::construction(
            "UPDATE target must be a table",
        )),
    }
}
