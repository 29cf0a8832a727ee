//! Raw fragment parsing.
//!
//! Turns strings such as `"users.id as uid"`, `"public.users as u"` or
//! `"meta->tags->0"` into AST leaves. Quoted segments (`"x"`, `` `x` ``,
//! `[x]`) are unquoted here so the AST never carries dialect quoting.

mod error;
mod lexer;
mod parser;

pub use error::FragmentError;
pub use lexer::Span;
pub use parser::{parse_column, parse_table};
