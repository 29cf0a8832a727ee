//! INSERT, UPDATE, DELETE and TRUNCATE lowering.
//!
//! UPDATE and DELETE with joins follow the dialect's [`DmlJoinStrategy`].
//! Engines without multi-table DML get a single-table statement restricted
//! by `row_id IN (SELECT row_id FROM <joined query>)`; the sub-select is a
//! reduced projection of the plan, which itself is never modified.

use std::slice;

use tracing::debug;

use super::{CompiledQuery, Grammar};
use crate::ast::{
    AssignmentSetClause, ColumnReferenceExpression, ComparisonOperator, ConflictClause,
    DeleteSpecification, Expression, FromClause, Identifier, InValues, InsertSource,
    InsertSpecification, LimitClause, NestedExpression, OffsetClause, PathExpression,
    QueryExpression, QuerySpecification, ReturningClause, SelectItem, SelectList, Statement,
    TableName, TableReference, TruncateSpecification, UpdateSpecification, UpsertClause,
    WhereClause,
};
use crate::binding::BindingType;
use crate::dialect::{DmlJoinStrategy, InsertIdStyle, TruncateStyle, UpsertStyle};
use crate::error::{GrammarError, Result};
use crate::fragment::parse_column;
use crate::plan::{InsertMode, Query, Row, Source};
use crate::value::SqlValue;

/// Default column returned by `compile_insert_get_id`.
const DEFAULT_ID_COLUMN: &str = "id";

/// Column of the SQLite sequence table holding the table name.
const SEQUENCE_NAME_COLUMN: &str = "name";

/// How a DML statement reaches its rows.
enum DmlShape {
    /// Plain single-table statement.
    Single,
    /// Multi-table statement in the engine's own syntax.
    Joined,
    /// Single-table statement filtered through the physical row id.
    RowId(&'static str),
}

impl Grammar<'_> {
    /// Compiles an INSERT of `rows`. No rows inserts a single row of
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when rows disagree on their columns, or when
    /// `mode` is not supported by the dialect.
    pub fn compile_insert(
        &self,
        query: &Query,
        rows: &[Row],
        mode: InsertMode,
    ) -> Result<CompiledQuery> {
        let conflict = match mode {
            InsertMode::Into => None,
            InsertMode::Ignore => Some(ConflictClause::Ignore),
        };
        let insert = self.lower_insert(query, rows, conflict)?;
        self.compile("insert", &Statement::Insert(insert))
    }

    /// Compiles an INSERT that skips rows colliding with existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UnsupportedOperation`] on SQL Server.
    pub fn compile_insert_or_ignore(&self, query: &Query, rows: &[Row]) -> Result<CompiledQuery> {
        self.compile_insert(query, rows, InsertMode::Ignore)
    }

    /// Compiles an INSERT of one row that yields the generated key.
    /// `sequence` names the key column and defaults to `id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the plan has no target table.
    pub fn compile_insert_get_id(
        &self,
        query: &Query,
        row: &Row,
        sequence: Option<&str>,
    ) -> Result<CompiledQuery> {
        let column = Identifier::new(sequence.unwrap_or(DEFAULT_ID_COLUMN));
        let mut insert = self.lower_insert(query, slice::from_ref(row), None)?;
        match self.dialect.insert_id_style() {
            InsertIdStyle::Driver => self.compile("insert_get_id", &Statement::Insert(insert)),
            InsertIdStyle::Returning => {
                insert.returning = Some(ReturningClause { column });
                self.compile("insert_get_id", &Statement::Insert(insert))
            }
            InsertIdStyle::ScopeIdentity => {
                let mut compiled = self.render(&Statement::Insert(insert))?;
                compiled.sql = format!(
                    "SET NOCOUNT ON; {}; SELECT SCOPE_IDENTITY() AS {}",
                    compiled.sql,
                    self.dialect.quote_identifier(column.as_str())
                );
                Ok(self.finish("insert_get_id", compiled))
            }
        }
    }

    /// Compiles `INSERT INTO t (columns) SELECT …`.
    ///
    /// # Errors
    ///
    /// Returns an error when a column is not a plain name.
    pub fn compile_insert_using(
        &self,
        query: &Query,
        columns: &[&str],
        source: &Query,
    ) -> Result<CompiledQuery> {
        let insert = InsertSpecification {
            table: self.dml_table(query, "INSERT")?.without_alias(),
            columns: columns
                .iter()
                .map(|column| plain_column(column))
                .collect::<Result<Vec<_>>>()?,
            source: InsertSource::Query(NestedExpression::plan(source.clone())),
            conflict: None,
            returning: None,
        };
        self.compile("insert_using", &Statement::Insert(insert))
    }

    /// Compiles an insert-or-update keyed on `unique_by`. An empty `update`
    /// list degrades to insert-or-ignore.
    ///
    /// # Errors
    ///
    /// Returns an error when there are no rows, when `unique_by` is empty
    /// on engines that need it, or when the dialect has no upsert syntax.
    pub fn compile_upsert(
        &self,
        query: &Query,
        rows: &[Row],
        unique_by: &[&str],
        update: &[&str],
    ) -> Result<CompiledQuery> {
        if rows.is_empty() {
            return Err(GrammarError::construction("upsert requires at least one row"));
        }
        let style = self.dialect.upsert_style();
        if style == UpsertStyle::Unsupported {
            return Err(GrammarError::unsupported(self.dialect.name(), "upsert"));
        }
        let conflict = if update.is_empty() {
            ConflictClause::Ignore
        } else {
            if unique_by.is_empty() && matches!(style, UpsertStyle::OnConflict | UpsertStyle::Merge) {
                return Err(GrammarError::construction(
                    "upsert requires at least one unique-by column",
                ));
            }
            ConflictClause::Update(UpsertClause {
                unique_by: unique_by
                    .iter()
                    .map(|column| plain_column(column))
                    .collect::<Result<Vec<_>>>()?,
                update: update
                    .iter()
                    .map(|column| plain_column(column))
                    .collect::<Result<Vec<_>>>()?,
            })
        };
        let insert = self.lower_insert(query, rows, Some(conflict))?;
        self.compile("upsert", &Statement::Insert(insert))
    }

    /// Compiles an UPDATE setting `values`.
    ///
    /// # Errors
    ///
    /// Returns an error when `values` is empty, or when the plan combines
    /// joins with ORDER BY/LIMIT, or carries an OFFSET, on an engine that
    /// cannot express it.
    pub fn compile_update(&self, query: &Query, values: &Row) -> Result<CompiledQuery> {
        if values.is_empty() {
            return Err(GrammarError::construction("update requires at least one column"));
        }
        let table = self.dml_table(query, "UPDATE")?;
        let assignments = values
            .iter()
            .map(|(column, value)| {
                Ok(AssignmentSetClause {
                    column: self.assignment_column(column)?,
                    value: self.operand(value, BindingType::Update)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut update = UpdateSpecification {
            table: TableReference::Table(table.clone()),
            assignments,
            from: None,
            where_clause: None,
            order_by: None,
            limit: None,
            has_joins: false,
        };
        match self.dml_shape(query, "UPDATE with joins and ORDER BY/LIMIT", false)? {
            DmlShape::RowId(column) => {
                update.where_clause = Some(self.row_id_filter(query, &table, column)?);
            }
            shape => {
                let joined = matches!(shape, DmlShape::Joined);
                update.has_joins = joined;
                update.where_clause = self.where_clause(query)?;
                update.order_by = self.order_by(&query.orders)?;
                update.limit = query.limit.map(|count| LimitClause { count });
                match self.dialect.dml_join_strategy() {
                    DmlJoinStrategy::UpdateFrom if joined || table.alias.is_some() => {
                        update.table = TableReference::Table(TableName {
                            path: PathExpression::new(vec![table.reference_name()]),
                            alias: None,
                        });
                        update.from = self.from_clause(query)?;
                    }
                    _ if joined => {
                        if let Some(from) = self.from_clause(query)? {
                            update.table = from.table;
                        }
                    }
                    _ => {}
                }
            }
        }
        self.compile("update", &Statement::Update(update))
    }

    /// Compiles a DELETE.
    ///
    /// # Errors
    ///
    /// Returns an error when the plan combines joins with ORDER BY/LIMIT, or
    /// carries an OFFSET, on an engine that cannot express it.
    pub fn compile_delete(&self, query: &Query) -> Result<CompiledQuery> {
        let table = self.dml_table(query, "DELETE")?;
        let rewrite = self.dialect.rewrites_delete_without_joins();
        let delete = match self.dml_shape(query, "DELETE with joins and ORDER BY/LIMIT", rewrite)? {
            DmlShape::RowId(column) => DeleteSpecification {
                target: None,
                from: FromClause {
                    table: TableReference::Table(table.clone()),
                },
                where_clause: Some(self.row_id_filter(query, &table, column)?),
                order_by: None,
                limit: None,
            },
            shape => {
                let explicit_target = matches!(shape, DmlShape::Joined)
                    || (table.alias.is_some()
                        && self.dialect.dml_join_strategy() == DmlJoinStrategy::UpdateFrom);
                let from = match self.from_clause(query)? {
                    Some(from) => from,
                    None => FromClause {
                        table: TableReference::Table(table.clone()),
                    },
                };
                DeleteSpecification {
                    target: explicit_target.then(|| table.reference_name()),
                    from,
                    where_clause: self.where_clause(query)?,
                    order_by: self.order_by(&query.orders)?,
                    limit: query.limit.map(|count| LimitClause { count }),
                }
            }
        };
        self.compile("delete", &Statement::Delete(delete))
    }

    /// Compiles TRUNCATE. Engines without it get one statement per step,
    /// in execution order.
    ///
    /// # Errors
    ///
    /// Returns an error when the plan has no target table.
    pub fn compile_truncate(&self, query: &Query) -> Result<Vec<CompiledQuery>> {
        let table = self.dml_table(query, "TRUNCATE")?.without_alias();
        match self.dialect.truncate_style() {
            TruncateStyle::SequenceReset { sequence_table } => {
                let name = table
                    .table()
                    .map(|name| name.as_str().to_owned())
                    .unwrap_or_default();
                let reset = DeleteSpecification {
                    target: None,
                    from: FromClause {
                        table: TableReference::Table(TableName {
                            path: PathExpression::single(sequence_table),
                            alias: None,
                        }),
                    },
                    where_clause: Some(WhereClause {
                        condition: Expression::Path(PathExpression::single(SEQUENCE_NAME_COLUMN))
                            .compare(
                                ComparisonOperator::Eq,
                                Expression::binding(SqlValue::Text(name), BindingType::Truncate),
                            ),
                    }),
                    order_by: None,
                    limit: None,
                };
                let delete = DeleteSpecification {
                    target: None,
                    from: FromClause {
                        table: TableReference::Table(table),
                    },
                    where_clause: None,
                    order_by: None,
                    limit: None,
                };
                Ok(vec![
                    self.compile("truncate", &Statement::Delete(reset))?,
                    self.compile("truncate", &Statement::Delete(delete))?,
                ])
            }
            TruncateStyle::TruncateTable | TruncateStyle::RestartIdentity => Ok(vec![self.compile(
                "truncate",
                &Statement::Truncate(TruncateSpecification { table }),
            )?]),
        }
    }

    fn lower_insert(
        &self,
        query: &Query,
        rows: &[Row],
        conflict: Option<ConflictClause>,
    ) -> Result<InsertSpecification> {
        let table = self.dml_table(query, "INSERT")?.without_alias();
        let Some(first) = rows.first().filter(|row| !row.is_empty()) else {
            if rows.len() > 1 {
                return Err(GrammarError::construction("inserted rows have no columns"));
            }
            return Ok(InsertSpecification {
                table,
                columns: Vec::new(),
                source: InsertSource::DefaultValues,
                conflict,
                returning: None,
            });
        };

        let names: Vec<&str> = first.columns().collect();
        let mut values = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            if row.len() != names.len() {
                return Err(GrammarError::construction(format!(
                    "row {index} has {} columns, expected {}",
                    row.len(),
                    names.len()
                )));
            }
            let tuple = names
                .iter()
                .map(|name| {
                    let value = row.get(name).ok_or_else(|| {
                        GrammarError::construction(format!("row {index} is missing column `{name}`"))
                    })?;
                    self.operand(value, BindingType::Insert)
                })
                .collect::<Result<Vec<_>>>()?;
            values.push(tuple);
        }
        Ok(InsertSpecification {
            table,
            columns: names
                .iter()
                .map(|name| plain_column(name))
                .collect::<Result<Vec<_>>>()?,
            source: InsertSource::Values(values),
            conflict,
            returning: None,
        })
    }

    /// The table a DML statement writes to.
    fn dml_table(&self, query: &Query, statement: &str) -> Result<TableName> {
        match &query.from {
            Some(Source::Table(fragment)) => self.table_name(fragment),
            _ => Err(GrammarError::construction(format!(
                "{statement} requires a table"
            ))),
        }
    }

    fn where_clause(&self, query: &Query) -> Result<Option<WhereClause>> {
        Ok(self
            .conditions(&query.wheres, BindingType::Where)?
            .map(|condition| WhereClause { condition }))
    }

    /// An UPDATE target column: a plain or qualified name.
    fn assignment_column(&self, fragment: &str) -> Result<PathExpression> {
        let column = parse_column(fragment)?;
        if column.alias.is_some() || !column.json.is_empty() || column
            .path
            .last()
            .is_some_and(Identifier::is_wildcard)
        {
            return Err(GrammarError::construction(format!(
                "`{fragment}` cannot be assigned"
            )));
        }
        Ok(self.prefix_qualifier(column.path))
    }

    fn dml_shape(&self, query: &Query, operation: &'static str, rewrite_always: bool) -> Result<DmlShape> {
        let has_joins = !query.joins.is_empty();
        let orders_or_limit = !query.orders.is_empty() || query.limit.is_some();
        let strategy = self.dialect.dml_join_strategy();
        if query.offset.is_some() && !matches!(strategy, DmlJoinStrategy::RowIdRewrite { .. }) {
            return Err(GrammarError::unsupported(
                self.dialect.name(),
                "OFFSET in UPDATE or DELETE",
            ));
        }
        match strategy {
            DmlJoinStrategy::RowIdRewrite { column } => {
                // OFFSET can only be expressed inside the sub-select.
                if rewrite_always
                    || has_joins
                    || query.offset.is_some()
                    || (orders_or_limit && !self.dialect.supports_dml_order_limit())
                {
                    Ok(DmlShape::RowId(column))
                } else {
                    Ok(DmlShape::Single)
                }
            }
            DmlJoinStrategy::Native => {
                if has_joins && orders_or_limit {
                    return Err(GrammarError::unsupported(self.dialect.name(), operation));
                }
                if orders_or_limit && !self.dialect.supports_dml_order_limit() {
                    return Err(GrammarError::unsupported(
                        self.dialect.name(),
                        "ORDER BY/LIMIT in UPDATE or DELETE",
                    ));
                }
                Ok(if has_joins { DmlShape::Joined } else { DmlShape::Single })
            }
            DmlJoinStrategy::UpdateFrom => {
                if !query.orders.is_empty() {
                    return Err(GrammarError::unsupported(
                        self.dialect.name(),
                        "ORDER BY in UPDATE or DELETE",
                    ));
                }
                Ok(if has_joins { DmlShape::Joined } else { DmlShape::Single })
            }
        }
    }

    /// `ref.row_id IN (SELECT ref.row_id FROM … WHERE … ORDER BY … LIMIT … OFFSET …)`
    fn row_id_filter(
        &self,
        query: &Query,
        table: &TableName,
        column: &'static str,
    ) -> Result<WhereClause> {
        debug!(
            dialect = self.dialect.name(),
            row_id = column,
            joins = query.joins.len(),
            "Restricting statement through row id sub-select"
        );
        let row_id = PathExpression::qualified(table.reference_name(), column);
        let mut projection = QuerySpecification::new(SelectList {
            items: vec![SelectItem::Column(ColumnReferenceExpression {
                path: row_id.clone(),
                json: Vec::new(),
                alias: None,
            })],
        });
        projection.from = self.from_clause(query)?;
        projection.where_clause = self.where_clause(query)?;
        projection.order_by = self.order_by(&query.orders)?;
        projection.limit = query.limit.map(|count| LimitClause { count });
        projection.offset = query.offset.map(|count| OffsetClause { count });

        let subquery = NestedExpression::query(QueryExpression::Specification(Box::new(projection)));
        Ok(WhereClause {
            condition: Expression::Path(row_id).in_values(InValues::Subquery(subquery), false),
        })
    }
}

/// A column named in an INSERT list or upsert key: one bare segment.
fn plain_column(fragment: &str) -> Result<Identifier> {
    let column = parse_column(fragment)?;
    match column.path.segments.as_slice() {
        [name] if column.alias.is_none() && column.json.is_empty() && !name.is_wildcard() => {
            Ok(name.clone())
        }
        _ => Err(GrammarError::construction(format!(
            "`{fragment}` is not a plain column name"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect, SqlServerDialect, SqliteDialect};
    use crate::plan::Filterable;

    #[test]
    fn test_insert_rows_must_agree() {
        let dialect = MySqlDialect::new();
        let grammar = Grammar::new(&dialect);
        let rows = [Row::new().set("a", 1), Row::new().set("b", 2)];
        assert!(matches!(
            grammar.compile_insert(&Query::table("t"), &rows, InsertMode::Into),
            Err(GrammarError::Construction(_))
        ));
    }

    #[test]
    fn test_insert_reorders_by_first_row() {
        let dialect = PostgresDialect::new();
        let grammar = Grammar::new(&dialect);
        let rows = [
            Row::new().set("a", 1).set("b", 2),
            Row::new().set("b", 4).set("a", 3),
        ];
        let compiled = grammar
            .compile_insert(&Query::table("t"), &rows, InsertMode::Into)
            .unwrap();
        assert_eq!(
            compiled.sql,
            "INSERT INTO \"t\" (\"a\", \"b\") VALUES (?, ?), (?, ?)"
        );
        assert_eq!(
            compiled.values(),
            vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3), SqlValue::Int(4)]
        );
    }

    #[test]
    fn test_plain_column() {
        assert_eq!(plain_column("email").unwrap().as_str(), "email");
        assert!(plain_column("users.email").is_err());
        assert!(plain_column("email as e").is_err());
    }

    #[test]
    fn test_sqlserver_rejects_ordered_delete() {
        let dialect = SqlServerDialect::new();
        let grammar = Grammar::new(&dialect);
        let query = Query::table("users").order_by("id").limit(1);
        assert!(matches!(
            grammar.compile_delete(&query),
            Err(GrammarError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_sqlite_delete_always_rewrites() {
        let dialect = SqliteDialect::new();
        let grammar = Grammar::new(&dialect);
        let compiled = grammar
            .compile_delete(&Query::table("users").where_eq("id", 1))
            .unwrap();
        assert_eq!(
            compiled.sql,
            "DELETE FROM \"users\" WHERE \"users\".\"rowid\" IN (SELECT \"users\".\"rowid\" FROM \"users\" WHERE \"id\" = ?)"
        );
    }

    #[test]
    fn test_offset_moves_into_row_id_subselect() {
        let dialect = PostgresDialect::new();
        let grammar = Grammar::new(&dialect);
        let compiled = grammar
            .compile_delete(&Query::table("users").offset(3))
            .unwrap();
        assert_eq!(
            compiled.sql,
            "DELETE FROM \"users\" WHERE \"users\".\"ctid\" IN (SELECT \"users\".\"ctid\" FROM \"users\" OFFSET 3)"
        );
    }

    #[test]
    fn test_offset_is_unsupported_without_row_id_rewrite() {
        let query = Query::table("users").where_eq("active", true).limit(2).offset(1);
        let mysql = MySqlDialect::new();
        let sqlserver = SqlServerDialect::new();
        for grammar in [Grammar::new(&mysql), Grammar::new(&sqlserver)] {
            assert!(matches!(
                grammar.compile_delete(&query),
                Err(GrammarError::UnsupportedOperation { .. })
            ));
            assert!(matches!(
                grammar.compile_update(&query, &Row::new().set("active", false)),
                Err(GrammarError::UnsupportedOperation { .. })
            ));
        }
    }

    #[test]
    fn test_update_requires_values() {
        let dialect = MySqlDialect::new();
        let grammar = Grammar::new(&dialect);
        assert!(grammar.compile_update(&Query::table("t"), &Row::new()).is_err());
    }
}
