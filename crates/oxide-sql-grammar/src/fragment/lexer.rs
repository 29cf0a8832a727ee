//! Fragment tokenizer.

/// Byte range of a token in the fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Fragment token kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A bare or quoted name. Quoted names never match `AS`.
    Identifier { name: String, quoted: bool },
    /// `.`
    Dot,
    /// `*`
    Star,
    /// `->`
    Arrow,
    /// End of input.
    Eof,
    /// Lexing error.
    Error(String),
}

impl TokenKind {
    /// Returns true for a bare `as` (any case).
    pub fn is_as(&self) -> bool {
        matches!(self, Self::Identifier { name, quoted: false } if name.eq_ignore_ascii_case("as"))
    }
}

/// A token with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// A lexer over a raw column or table fragment.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given fragment.
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            span: Span::new(self.start, self.pos),
        }
    }

    fn scan_bare(&mut self) -> Token {
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            self.advance();
        }
        let name = String::from(&self.input[self.start..self.pos]);
        self.make_token(TokenKind::Identifier {
            name,
            quoted: false,
        })
    }

    /// Scans `"x"`, `` `x` `` or `[x]`; the closing quote is escaped by doubling.
    fn scan_quoted(&mut self, close: char) -> Token {
        let mut name = String::new();
        loop {
            match self.advance() {
                Some(c) if c == close => {
                    if self.peek() == Some(close) {
                        self.advance();
                        name.push(close);
                    } else {
                        break;
                    }
                }
                Some(c) => name.push(c),
                None => {
                    return self.make_token(TokenKind::Error(String::from(
                        "unterminated quoted identifier",
                    )));
                }
            }
        }
        if name.is_empty() {
            return self.make_token(TokenKind::Error(String::from("empty quoted identifier")));
        }
        self.make_token(TokenKind::Identifier { name, quoted: true })
    }

    /// Scans the next token.
    pub fn next_token(&mut self) -> Token {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
        self.start = self.pos;

        let Some(c) = self.advance() else {
            return self.make_token(TokenKind::Eof);
        };

        match c {
            '.' => self.make_token(TokenKind::Dot),
            '*' => self.make_token(TokenKind::Star),
            '-' if self.peek() == Some('>') => {
                self.advance();
                self.make_token(TokenKind::Arrow)
            }
            '"' => self.scan_quoted('"'),
            '`' => self.scan_quoted('`'),
            '[' => self.scan_quoted(']'),
            c if c.is_alphanumeric() || c == '_' => {
                self.pos = self.start;
                self.scan_bare()
            }
            _ => self.make_token(TokenKind::Error(format!("unexpected character: {c}"))),
        }
    }
}
