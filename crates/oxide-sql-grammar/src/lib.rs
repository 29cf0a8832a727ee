//! # oxide-sql-grammar
//!
//! A dialect-aware SQL compiler. A query plan built with [`Query`] is
//! lowered into an AST, then rendered by a [`Visitor`] into SQL text for
//! MySQL, PostgreSQL, SQLite or SQL Server. Every value is bound as a
//! parameter; the bindings come back in placeholder order.
//!
//! ```rust
//! use oxide_sql_grammar::{Filterable, Grammar, PostgresDialect, Query, SqlValue};
//!
//! let dialect = PostgresDialect::new();
//! let grammar = Grammar::new(&dialect);
//!
//! let query = Query::table("users")
//!     .select(&["id", "name"])
//!     .where_eq("active", true)
//!     .where_in("role", ["admin", "owner"])
//!     .limit(10);
//!
//! let compiled = grammar.compile_select(&query).unwrap();
//! assert_eq!(
//!     compiled.sql,
//!     r#"SELECT "id", "name" FROM "users" WHERE "active" = ? AND "role" IN (?, ?) LIMIT 10"#
//! );
//! assert_eq!(compiled.values()[0], SqlValue::Bool(true));
//! ```
//!
//! ## Dialects
//!
//! Engines disagree on pagination, multi-table UPDATE/DELETE, identifier
//! quoting, insert-or-ignore and id retrieval. Each difference is a method
//! on [`Dialect`]; the grammar and visitor only ask questions of it.
//!
//! ```rust
//! use oxide_sql_grammar::{Grammar, Query, SqlServerDialect};
//!
//! let dialect = SqlServerDialect::new();
//! let sql = Grammar::new(&dialect)
//!     .compile_select(&Query::table("users").limit(5).offset(10))
//!     .unwrap()
//!     .sql;
//! assert_eq!(
//!     sql,
//!     "SELECT TOP 5 * FROM [users] ORDER BY (SELECT 0) OFFSET 10 ROWS"
//! );
//! ```

pub mod ast;
pub mod binding;
pub mod config;
pub mod dialect;
pub mod error;
pub mod fragment;
pub mod grammar;
pub mod plan;
pub mod value;
pub mod visitor;

pub use binding::{Binding, BindingType, Bindings};
pub use config::GrammarConfig;
pub use dialect::{
    Dialect, DialectKind, MySqlDialect, PostgresDialect, SqlServerDialect, SqliteDialect,
};
pub use error::{GrammarError, Result};
pub use grammar::{CompiledQuery, Grammar};
pub use plan::{
    Filterable, InsertMode, JoinClause, JoinType, Lock, Operand, OrderDirection, Query,
    RawFragment, Row,
};
pub use value::{SqlValue, ToSqlValue};
pub use visitor::Visitor;
