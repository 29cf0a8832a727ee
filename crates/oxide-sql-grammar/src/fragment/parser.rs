//! Recursive-descent parser for column and table fragments.
//!
//! ```text
//! column := segment ('.' segment)* ('->' json)* (AS name)?
//! table  := name ('.' name)* (AS name)?
//! ```

use super::error::FragmentError;
use super::lexer::{Lexer, Token, TokenKind};
use crate::ast::{
    ColumnReferenceExpression, Identifier, JsonSegment, PathExpression, TableName,
};

/// Parses a column fragment such as `users.id as uid`, `users.*` or
/// `meta->tags->0`.
///
/// # Errors
///
/// Returns a `FragmentError` when the fragment is not a column path.
pub fn parse_column(input: &str) -> Result<ColumnReferenceExpression, FragmentError> {
    let mut parser = FragmentParser::new(input);
    let path = parser.parse_path(true)?;
    let json = if path.last().is_some_and(Identifier::is_wildcard) {
        Vec::new()
    } else {
        parser.parse_json_path()?
    };
    let alias = parser.parse_alias()?;
    if alias.is_some() && path.last().is_some_and(Identifier::is_wildcard) {
        return Err(parser.error_at_previous("a wildcard cannot be aliased"));
    }
    parser.expect_eof()?;
    Ok(ColumnReferenceExpression { path, json, alias })
}

/// Parses a table fragment such as `users`, `public.users` or `users as u`.
///
/// # Errors
///
/// Returns a `FragmentError` when the fragment is not a table path.
pub fn parse_table(input: &str) -> Result<TableName, FragmentError> {
    let mut parser = FragmentParser::new(input);
    let path = parser.parse_path(false)?;
    let alias = parser.parse_alias()?;
    parser.expect_eof()?;
    Ok(TableName { path, alias })
}

struct FragmentParser<'a> {
    input: &'a str,
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
}

impl<'a> FragmentParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        let previous = current.clone();
        Self {
            input,
            lexer,
            current,
            previous,
        }
    }

    fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.lexer.next_token());
    }

    fn error(&self, message: impl Into<String>) -> FragmentError {
        let message = match &self.current.kind {
            TokenKind::Error(lex) => format!("{}: {lex}", message.into()),
            _ => message.into(),
        };
        FragmentError::new(message, self.current.span, self.input)
    }

    fn error_at_previous(&self, message: &str) -> FragmentError {
        FragmentError::new(message, self.previous.span, self.input)
    }

    /// Takes the current token as a name. Bare `as` is not a name.
    fn expect_name(&mut self) -> Result<Identifier, FragmentError> {
        match &self.current.kind {
            TokenKind::Identifier { name, .. } if !self.current.kind.is_as() => {
                let ident = Identifier::new(name.clone());
                self.advance();
                Ok(ident)
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    fn parse_path(&mut self, allow_wildcard: bool) -> Result<PathExpression, FragmentError> {
        let mut segments = Vec::new();
        loop {
            if allow_wildcard && self.current.kind == TokenKind::Star {
                self.advance();
                segments.push(Identifier::wildcard());
                break;
            }
            segments.push(self.expect_name()?);
            if self.current.kind != TokenKind::Dot {
                break;
            }
            self.advance();
        }
        Ok(PathExpression::new(segments))
    }

    fn parse_json_path(&mut self) -> Result<Vec<JsonSegment>, FragmentError> {
        let mut path = Vec::new();
        while self.current.kind == TokenKind::Arrow {
            self.advance();
            let TokenKind::Identifier { name, quoted } = &self.current.kind else {
                return Err(self.error("expected JSON path segment"));
            };
            let segment = match name.parse::<u64>() {
                Ok(index) if !quoted => JsonSegment::Index(index),
                _ => JsonSegment::Key(name.clone()),
            };
            path.push(segment);
            self.advance();
        }
        Ok(path)
    }

    fn parse_alias(&mut self) -> Result<Option<Identifier>, FragmentError> {
        if !self.current.kind.is_as() {
            return Ok(None);
        }
        self.advance();
        self.expect_name().map(Some)
    }

    fn expect_eof(&self) -> Result<(), FragmentError> {
        if self.current.kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(self.error("expected AS or end of fragment"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(path: &PathExpression) -> Vec<&str> {
        path.segments.iter().map(Identifier::as_str).collect()
    }

    #[test]
    fn test_parse_qualified_column_with_alias() {
        let column = parse_column("users.id as uid").unwrap();
        assert_eq!(names(&column.path), vec!["users", "id"]);
        assert_eq!(column.alias.unwrap().as_str(), "uid");
        assert!(column.json.is_empty());
    }

    #[test]
    fn test_parse_alias_keyword_is_case_insensitive() {
        let column = parse_column("name AS display_name").unwrap();
        assert_eq!(column.alias.unwrap().as_str(), "display_name");
    }

    #[test]
    fn test_parse_wildcards() {
        let all = parse_column("*").unwrap();
        assert!(all.path.segments[0].is_wildcard());

        let qualified = parse_column("posts.*").unwrap();
        assert_eq!(names(&qualified.path), vec!["posts", "*"]);
    }

    #[test]
    fn test_parse_json_path() {
        let column = parse_column("options->languages->0").unwrap();
        assert_eq!(names(&column.path), vec!["options"]);
        assert_eq!(
            column.json,
            vec![
                JsonSegment::Key(String::from("languages")),
                JsonSegment::Index(0)
            ]
        );
    }

    #[test]
    fn test_parse_quoted_reserved_word() {
        let column = parse_column("`order`.`group`").unwrap();
        assert_eq!(names(&column.path), vec!["order", "group"]);
    }

    #[test]
    fn test_parse_schema_table_alias() {
        let table = parse_table("public.users as u").unwrap();
        assert_eq!(names(&table.path), vec!["public", "users"]);
        assert_eq!(table.alias.unwrap().as_str(), "u");
    }

    #[test]
    fn test_rejects_implicit_alias() {
        let err = parse_table("users u").unwrap_err();
        assert_eq!(err.message, "expected AS or end of fragment");
        assert_eq!(err.span.start, 6);
    }

    #[test]
    fn test_rejects_empty_and_dangling() {
        assert_eq!(parse_table("").unwrap_err().message, "expected identifier");
        assert_eq!(parse_table("users as").unwrap_err().message, "expected identifier");
        assert_eq!(parse_column("users.").unwrap_err().message, "expected identifier");
        assert!(parse_table("*").is_err());
        assert!(parse_column("* as everything").is_err());
    }

    #[test]
    fn test_lex_error_is_reported() {
        let err = parse_column("users;drop").unwrap_err();
        assert_eq!(
            err.message,
            "expected AS or end of fragment: unexpected character: ;"
        );
    }
}
