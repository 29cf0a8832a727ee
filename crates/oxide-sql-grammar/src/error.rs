//! Error types for SQL compilation.

use crate::fragment::FragmentError;

/// Errors raised while lowering a plan or rendering an AST.
///
/// Compilation fails closed: no variant is recovered from inside this crate.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    /// The plan describes a node shape that cannot be built.
    #[error("invalid query construction: {0}")]
    Construction(String),

    /// The active dialect has no syntax for the requested operation.
    #[error("{dialect} does not support {operation}")]
    UnsupportedOperation {
        /// Dialect name.
        dialect: &'static str,
        /// The operation that was requested.
        operation: &'static str,
    },

    /// The renderer met a node value it cannot classify.
    #[error("unexpected node: {0}")]
    UnexpectedNode(String),

    /// A raw column or table string is neither an identifier nor a path.
    #[error("invalid fragment: {0}")]
    Fragment(#[from] FragmentError),

    /// A configuration document could not be read.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl GrammarError {
    /// Creates a construction error.
    #[must_use]
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction(message.into())
    }

    /// Creates an unsupported-operation error.
    #[must_use]
    pub const fn unsupported(dialect: &'static str, operation: &'static str) -> Self {
        Self::UnsupportedOperation { dialect, operation }
    }
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, GrammarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GrammarError::unsupported("sqlserver", "insert or ignore");
        assert_eq!(err.to_string(), "sqlserver does not support insert or ignore");

        let err = GrammarError::construction("query has no FROM table");
        assert_eq!(
            err.to_string(),
            "invalid query construction: query has no FROM table"
        );
    }
}
