//! Query plans.
//!
//! A [`Query`] is an ordered bag of clause lists assembled by builder
//! methods. The grammar only reads it; compiling never changes the plan,
//! and bindings are returned with the compiled text instead of being
//! stored on it.

mod condition;
mod join;
mod query;

pub use condition::{Filterable, Operand, RawFragment, Where, WhereKind};
pub use join::{JoinClause, JoinTarget};
pub use query::{Aggregate, Order, Query, Row, Selection, Source, Union};

/// Join types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinType {
    /// Returns the SQL keyword(s).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Row locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lock {
    /// Exclusive lock for a later update.
    Update,
    /// Shared lock.
    Shared,
    /// Dialect text emitted as given.
    Raw(String),
}

/// How INSERT treats rows that collide with existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMode {
    /// Plain `INSERT INTO`; a collision is an error.
    #[default]
    Into,
    /// Skip colliding rows.
    Ignore,
}
