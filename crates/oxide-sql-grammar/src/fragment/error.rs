//! Fragment parse errors.

use super::lexer::Span;

/// A raw column or table string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentError {
    /// The error message.
    pub message: String,
    /// The location of the error.
    pub span: Span,
    /// The fragment being parsed.
    pub input: String,
}

impl FragmentError {
    /// Creates a new fragment error.
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span, input: &str) -> Self {
        Self {
            message: message.into(),
            span,
            input: String::from(input),
        }
    }
}

impl std::fmt::Display for FragmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} in `{}` at position {}..{}",
            self.message, self.input, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for FragmentError {}
