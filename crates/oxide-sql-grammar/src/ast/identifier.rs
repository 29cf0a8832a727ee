//! Identifier leaves: names, paths, column and table references.
//!
//! Identifiers are stored unquoted. Quoting happens only when the visitor
//! renders them through the active dialect.

/// An unquoted SQL name. `*` is a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Creates an identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The `*` wildcard.
    #[must_use]
    pub fn wildcard() -> Self {
        Self(String::from("*"))
    }

    /// Returns the raw name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for `*`.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0 == "*"
    }
}

/// A dotted name such as `schema.table.column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    /// The segments, outermost first.
    pub segments: Vec<Identifier>,
}

impl PathExpression {
    /// Creates a path from segments.
    #[must_use]
    pub fn new(segments: Vec<Identifier>) -> Self {
        Self { segments }
    }

    /// Creates a single-segment path.
    #[must_use]
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Identifier::new(name)],
        }
    }

    /// Creates `qualifier.name`.
    #[must_use]
    pub fn qualified(qualifier: Identifier, name: impl Into<String>) -> Self {
        Self {
            segments: vec![qualifier, Identifier::new(name)],
        }
    }

    /// Returns the last segment.
    #[must_use]
    pub fn last(&self) -> Option<&Identifier> {
        self.segments.last()
    }

    /// Returns true when the path has a qualifier.
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.segments.len() > 1
    }

    /// Prepends `qualifier` unless the path is already qualified.
    #[must_use]
    pub fn qualify(self, qualifier: &Identifier) -> Self {
        if self.is_qualified() {
            return self;
        }
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(qualifier.clone());
        segments.extend(self.segments);
        Self { segments }
    }
}

/// One step of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonSegment {
    /// Object member.
    Key(String),
    /// Array element.
    Index(u64),
}

/// A JSON selector such as `meta->tags->0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPathExpression {
    /// The JSON column.
    pub column: PathExpression,
    /// The path inside the document.
    pub path: Vec<JsonSegment>,
}

/// A column reference as written in a select list: path, JSON path and alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReferenceExpression {
    /// The column path.
    pub path: PathExpression,
    /// JSON selector steps following the column, if any.
    pub json: Vec<JsonSegment>,
    /// The `AS` alias.
    pub alias: Option<Identifier>,
}

/// A table name with an optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    /// `schema.table` or `table`.
    pub path: PathExpression,
    /// The `AS` alias.
    pub alias: Option<Identifier>,
}

impl TableName {
    /// The name other clauses use to refer to this table: the alias if
    /// present, the table name otherwise.
    #[must_use]
    pub fn reference_name(&self) -> Identifier {
        match (&self.alias, self.path.last()) {
            (Some(alias), _) => alias.clone(),
            (None, Some(name)) => name.clone(),
            (None, None) => Identifier::new(""),
        }
    }

    /// Returns the bare table name (last path segment).
    #[must_use]
    pub fn table(&self) -> Option<&Identifier> {
        self.path.last()
    }

    /// Returns a copy without its alias.
    #[must_use]
    pub fn without_alias(&self) -> Self {
        Self {
            path: self.path.clone(),
            alias: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_only_bare_paths() {
        let users = Identifier::new("users");
        let bare = PathExpression::single("name").qualify(&users);
        assert_eq!(bare.segments.len(), 2);
        assert_eq!(bare.segments[0].as_str(), "users");

        let already = PathExpression::qualified(Identifier::new("posts"), "title").qualify(&users);
        assert_eq!(already.segments[0].as_str(), "posts");
    }

    #[test]
    fn test_reference_name_prefers_alias() {
        let table = TableName {
            path: PathExpression::single("users"),
            alias: Some(Identifier::new("u")),
        };
        assert_eq!(table.reference_name().as_str(), "u");
        assert_eq!(table.without_alias().reference_name().as_str(), "users");
    }
}
