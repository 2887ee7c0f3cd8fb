//! Tokenizer and parser for the small arithmetic language used in tracker
//! templates: numbers, function calls, unary `+`/`-` and the binary
//! operators `+ - * / %`.
//!
//! ```
//! let expr = lang::parse("max(dataset(0)) - min(dataset(0))").unwrap();
//! assert_eq!(expr.short_name(), "-");
//! ```

pub(crate) mod lexer;
pub(crate) mod parser;

pub use lexer::LexingError;
pub use logos::Span;
pub use parser::{BinOp, Error, ErrorKind, Expression, Ident, Literal, Parser, UnaryOp};

/// Parse `input` as a single expression. The whole input must be consumed.
pub fn parse(input: &str) -> Result<Expression, Error> {
    Parser::new(input).parse()
}
