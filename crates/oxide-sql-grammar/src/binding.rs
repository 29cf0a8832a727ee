//! Binding registration.
//!
//! Every placeholder the visitor emits is paired with exactly one [`Binding`],
//! appended in the order the placeholder appears in the text. The purpose tag
//! records which clause produced the value, so callers can still look at the
//! classic per-purpose buckets through [`Bindings::bucket`].

use serde::{Deserialize, Serialize};

use crate::value::SqlValue;

/// The clause a binding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingType {
    /// Select-list expressions.
    Select,
    /// Derived tables in FROM.
    From,
    /// Join conditions.
    Join,
    /// WHERE predicates.
    #[default]
    Where,
    /// GROUP BY expressions.
    GroupBy,
    /// HAVING predicates.
    Having,
    /// ORDER BY expressions.
    Order,
    /// Bindings migrated from union branches.
    Union,
    /// Union-level ORDER BY expressions.
    UnionOrder,
    /// INSERT values.
    Insert,
    /// UPDATE SET values.
    Update,
    /// Join conditions of a multi-table UPDATE.
    UpdateJoin,
    /// Statements emitted by TRUNCATE emulation.
    Truncate,
}

impl BindingType {
    /// Returns the bucket name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::From => "from",
            Self::Join => "join",
            Self::Where => "where",
            Self::GroupBy => "groupBy",
            Self::Having => "having",
            Self::Order => "order",
            Self::Union => "union",
            Self::UnionOrder => "unionOrder",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::UpdateJoin => "updateJoin",
            Self::Truncate => "truncate",
        }
    }
}

/// A value paired with the clause that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// The parameter value.
    pub value: SqlValue,
    /// The bucket the value belongs to.
    pub purpose: BindingType,
}

/// Bindings in placeholder order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bindings {
    entries: Vec<Binding>,
}

impl Bindings {
    /// Creates an empty binding list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a value.
    pub fn push(&mut self, value: SqlValue, purpose: BindingType) {
        self.entries.push(Binding { value, purpose });
    }

    /// Appends the bindings of a nested compilation, moving them into `purpose`.
    pub fn splice(&mut self, nested: Self, purpose: BindingType) {
        self.entries
            .extend(nested.entries.into_iter().map(|b| Binding {
                value: b.value,
                purpose,
            }));
    }

    /// Appends the bindings of a nested compilation, keeping their tags.
    pub fn append(&mut self, nested: Self) {
        self.entries.extend(nested.entries);
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no value was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the bindings in placeholder order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.entries.iter()
    }

    /// Returns the values of one bucket, in placeholder order.
    #[must_use]
    pub fn bucket(&self, purpose: BindingType) -> Vec<&SqlValue> {
        self.entries
            .iter()
            .filter(|b| b.purpose == purpose)
            .map(|b| &b.value)
            .collect()
    }

    /// Returns the positional parameter list.
    #[must_use]
    pub fn values(&self) -> Vec<SqlValue> {
        self.entries.iter().map(|b| b.value.clone()).collect()
    }

    /// Consumes the list and returns the positional parameters.
    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.entries.into_iter().map(|b| b.value).collect()
    }
}

impl IntoIterator for Bindings {
    type Item = Binding;
    type IntoIter = std::vec::IntoIter<Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_view_keeps_order() {
        let mut bindings = Bindings::new();
        bindings.push(SqlValue::Int(1), BindingType::Join);
        bindings.push(SqlValue::Int(2), BindingType::Where);
        bindings.push(SqlValue::Int(3), BindingType::Where);

        assert_eq!(
            bindings.bucket(BindingType::Where),
            vec![&SqlValue::Int(2), &SqlValue::Int(3)]
        );
        assert_eq!(bindings.bucket(BindingType::Join), vec![&SqlValue::Int(1)]);
        assert!(bindings.bucket(BindingType::Having).is_empty());
        assert_eq!(
            bindings.values(),
            vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]
        );
    }

    #[test]
    fn test_splice_retags_nested_bindings() {
        let mut nested = Bindings::new();
        nested.push(SqlValue::Int(10), BindingType::Where);
        nested.push(SqlValue::Int(11), BindingType::Having);

        let mut outer = Bindings::new();
        outer.push(SqlValue::Int(1), BindingType::Select);
        outer.splice(nested, BindingType::Union);

        assert_eq!(outer.len(), 3);
        assert_eq!(outer.bucket(BindingType::Union).len(), 2);
        assert!(outer.bucket(BindingType::Having).is_empty());
    }

    #[test]
    fn test_binding_type_names() {
        assert_eq!(BindingType::UpdateJoin.as_str(), "updateJoin");
        assert_eq!(BindingType::default(), BindingType::Where);
    }
}
