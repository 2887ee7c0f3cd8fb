/*
max(dataset(0) * 2) - min(setMissingValues(dataset(1), 0)) % 7
*/

use std::{borrow::Cow, fmt, iter::Peekable};

use logos::{Logos, Span, SpannedIter};
use miette::SourceSpan;

use crate::lexer::{LexingError, Token};

#[derive(Debug, Clone, thiserror::Error, miette::Diagnostic)]
#[error("{kind}")]
pub struct Error {
    #[source_code]
    src: String,

    #[diagnostic_source]
    kind: ErrorKind,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn source_text(&self) -> &str {
        &self.src
    }
}

#[derive(Debug, Clone, thiserror::Error, miette::Diagnostic)]
pub enum ErrorKind {
    #[error("{error}")]
    Lexer {
        #[source]
        error: LexingError,
        #[label("Here")]
        span: SourceSpan,
    },

    #[error("Expected primary expression, found {found}")]
    #[diagnostic(help("expressions are made of numbers, function calls and + - * / %"))]
    ExpectedPrimary {
        found: Cow<'static, str>,
        #[label("Expected a number or a function call")]
        span: SourceSpan,
    },

    #[error("Missing closing parenthesis")]
    MissingParens {
        #[label("Opening parenthesis")]
        left: SourceSpan,
        #[label("Missing parenthesis")]
        right: SourceSpan,
    },

    #[error("Unexpected {found} after the end of the expression")]
    TrailingInput {
        found: Cow<'static, str>,
        #[label("Unexpected")]
        span: SourceSpan,
    },
}

type Result<T, E = Error> = std::result::Result<T, E>;

fn source_span(span: &Span) -> SourceSpan {
    SourceSpan::new(span.start.into(), span.end - span.start)
}

pub struct Parser<'a> {
    source: &'a str,
    tokens: Peekable<SpannedIter<'a, Token<'a>>>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let tokens = Token::lexer(input).spanned().peekable();
        Parser {
            source: input,
            tokens,
        }
    }

    pub fn error(&self, kind: ErrorKind) -> Error {
        Error {
            src: self.source.into(),
            kind,
        }
    }

    fn end_of_input(&self) -> Span {
        self.source.len()..self.source.len()
    }

    fn primary_error(&self, found: impl Into<Cow<'static, str>>, span: &Span) -> Error {
        self.error(ErrorKind::ExpectedPrimary {
            found: found.into(),
            span: source_span(span),
        })
    }

    /// Consume the next token, turning lexing failures into parse errors.
    fn next_token(&mut self) -> Result<Option<(Token<'a>, Span)>> {
        match self.tokens.next() {
            None => Ok(None),
            Some((Ok(token), span)) => Ok(Some((token, span))),
            Some((Err(error), span)) => Err(self.error(ErrorKind::Lexer {
                error,
                span: source_span(&span),
            })),
        }
    }

    /// Look at the next token without consuming it. Lexing failures are
    /// reported when the token is actually consumed.
    fn peek_token(&mut self) -> Option<Token<'a>> {
        match self.tokens.peek() {
            Some((Ok(token), _)) => Some(*token),
            _ => None,
        }
    }

    /// Parse the whole input as a single expression.
    pub fn parse(mut self) -> Result<Expression> {
        let expr = self.parse_expression()?;
        match self.next_token()? {
            None => Ok(expr),
            Some((token, span)) => Err(self.error(ErrorKind::TrailingInput {
                found: token.short_name().into(),
                span: source_span(&span),
            })),
        }
    }

    pub fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expression> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.peek_token().and_then(BinOp::from_token) {
            if op.precedence() < min_precedence {
                break;
            }
            self.tokens.next();
            let right = self.parse_binary(op.precedence() + 1)?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let op = match self.peek_token() {
            Some(Token::Minus) => UnaryOp::Negate,
            Some(Token::Plus) => UnaryOp::Identity,
            _ => return self.parse_primary(),
        };
        let (_, op_span) = self.next_token()?.ok_or_else(|| {
            let eof = self.end_of_input();
            self.primary_error("end of input", &eof)
        })?;
        let operand = self.parse_unary()?;
        Ok(Expression::Unary {
            op,
            op_span,
            operand: Box::new(operand),
        })
    }

    pub fn parse_primary(&mut self) -> Result<Expression> {
        let Some((token, span)) = self.next_token()? else {
            let eof = self.end_of_input();
            return Err(self.primary_error("end of input", &eof));
        };

        match token {
            Token::Number(n) => Ok(Expression::Primary(Literal::Number(span, n))),
            Token::Bool(b) => Ok(Expression::Primary(Literal::Bool(span, b))),
            Token::String(s) => Ok(Expression::Primary(Literal::String(span, s.to_string()))),
            Token::Ident(name) => {
                let ident = Ident {
                    name: name.to_string(),
                    span,
                };
                if self.peek_token() == Some(Token::LeftParens) {
                    self.parse_call(ident)
                } else {
                    Ok(Expression::Identifier(ident))
                }
            }
            Token::LeftParens => {
                let left = span;
                let expr = self.parse_expression()?;
                let right = self.expect_closing(&left)?;

                Ok(Expression::Group {
                    opening_paren: left,
                    expression: Box::new(expr),
                    closing_paren: right,
                })
            }
            other => Err(self.primary_error(other.short_name(), &span)),
        }
    }

    fn parse_call(&mut self, callee: Ident) -> Result<Expression> {
        let left = match self.tokens.next() {
            Some((_, span)) => span,
            None => self.end_of_input(),
        };

        let mut args = Vec::new();
        if self.peek_token() == Some(Token::RightParens) {
            let closing_paren = self.expect_closing(&left)?;
            return Ok(Expression::Call {
                callee,
                args,
                closing_paren,
            });
        }

        loop {
            args.push(self.parse_expression()?);
            if self.peek_token() == Some(Token::Comma) {
                self.tokens.next();
                continue;
            }
            break;
        }
        let closing_paren = self.expect_closing(&left)?;

        Ok(Expression::Call {
            callee,
            args,
            closing_paren,
        })
    }

    fn expect_closing(&mut self, left: &Span) -> Result<Span> {
        let next = self.tokens.next();
        let right = match &next {
            Some((_, span)) => span.clone(),
            None => self.end_of_input(),
        };
        let error = self.error(ErrorKind::MissingParens {
            left: source_span(left),
            right: source_span(&right),
        });

        match next {
            Some((Ok(Token::RightParens), span)) => Ok(span),
            _ => Err(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Primary(Literal),
    Identifier(Ident),
    Unary {
        op: UnaryOp,
        op_span: Span,
        operand: Box<Expression>,
    },
    Binary {
        op: BinOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Call {
        callee: Ident,
        args: Vec<Expression>,
        closing_paren: Span,
    },
    Group {
        opening_paren: Span,
        expression: Box<Expression>,
        closing_paren: Span,
    },
}

impl Expression {
    pub fn short_name(&self) -> &'static str {
        match self {
            Expression::Primary(primary) => primary.short_name(),
            Expression::Identifier(_) => "identifier",
            Expression::Unary { op, .. } => op.short_name(),
            Expression::Binary { op, .. } => op.short_name(),
            Expression::Call { .. } => "function call",
            Expression::Group { .. } => "parens",
        }
    }

    /// Byte range covered by the expression in its source.
    pub fn span(&self) -> Span {
        match self {
            Expression::Primary(lit) => lit.span(),
            Expression::Identifier(ident) => ident.span.clone(),
            Expression::Unary {
                op_span, operand, ..
            } => op_span.start..operand.span().end,
            Expression::Binary { left, right, .. } => left.span().start..right.span().end,
            Expression::Call {
                callee,
                closing_paren,
                ..
            } => callee.span.start..closing_paren.end,
            Expression::Group {
                opening_paren,
                closing_paren,
                ..
            } => opening_paren.start..closing_paren.end,
        }
    }

    #[cfg(test)]
    pub fn unwrap_literal(self) -> Literal {
        match self {
            Expression::Primary(lit) => lit,
            expr => panic!("Unwraped literal, but {} was found", expr.short_name()),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Primary(Literal::Number(_, n)) => write!(f, "{n}"),
            Expression::Primary(Literal::Bool(_, b)) => write!(f, "{b}"),
            Expression::Primary(Literal::String(_, s)) => write!(f, "{s:?}"),
            Expression::Identifier(ident) => f.write_str(&ident.name),
            Expression::Unary { op, operand, .. } => write!(f, "{}{operand}", op.symbol()),
            Expression::Binary { op, left, right } => {
                write!(f, "{left} {} {right}", op.symbol())
            }
            Expression::Call { callee, args, .. } => {
                write!(f, "{}(", callee.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expression::Group { expression, .. } => write!(f, "({expression})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(Span, String),
    Bool(Span, bool),
    Number(Span, f64),
}

impl Literal {
    pub fn short_name(&self) -> &'static str {
        match self {
            Literal::String(_, _) => "string",
            Literal::Bool(_, _) => "boolean",
            Literal::Number(_, _) => "number",
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Literal::String(span, _) | Literal::Bool(span, _) | Literal::Number(span, _) => {
                span.clone()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Identity,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Identity => "+",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "negation",
            UnaryOp::Identity => "unary plus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinOp {
    fn from_token(token: Token<'_>) -> Option<Self> {
        match token {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Subtract),
            Token::Star => Some(BinOp::Multiply),
            Token::Slash => Some(BinOp::Divide),
            Token::Percent => Some(BinOp::Modulo),
            _ => None,
        }
    }

    /// Higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            BinOp::Add | BinOp::Subtract => 1,
            BinOp::Multiply | BinOp::Divide | BinOp::Modulo => 2,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
        }
    }

    pub fn short_name(&self) -> &'static str {
        self.symbol()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(input: &str) -> Expression {
        Parser::new(input).parse().unwrap()
    }

    #[test]
    fn test_literal() {
        for (input, ret) in [
            ("30", Literal::Number(0.."30".len(), 30.0)),
            ("0.5", Literal::Number(0.."0.5".len(), 0.5)),
            ("true", Literal::Bool(0.."true".len(), true)),
            ("'abc'", Literal::String(0.."'abc'".len(), "abc".to_string())),
        ] {
            let mut parser = Parser::new(input);
            let lit = parser.parse_primary().unwrap().unwrap_literal();
            assert_eq!(lit, ret);
        }
    }

    #[test]
    fn identifier_without_call() {
        let expr = parse("maxStreak");
        assert!(
            matches!(expr, Expression::Identifier(Ident { ref name, .. }) if name == "maxStreak")
        );
    }

    #[test]
    fn precedence() {
        insta::assert_snapshot!(parse("1 + 2 * 3 - 4 % 5").to_string(), @"1 + 2 * 3 - 4 % 5");

        let Expression::Binary { op, left, right } = parse("1 + 2 * 3") else {
            panic!("expected a binary expression");
        };
        assert_eq!(op, BinOp::Add);
        assert_eq!(left.short_name(), "number");
        assert_eq!(right.short_name(), "*");
    }

    #[test]
    fn left_associativity() {
        let Expression::Binary { op, left, right } = parse("8 - 4 - 2") else {
            panic!("expected a binary expression");
        };
        assert_eq!(op, BinOp::Subtract);
        assert_eq!(left.short_name(), "-");
        assert_eq!(right.span(), 8..9);
    }

    #[test]
    fn unary() {
        let Expression::Unary { op, operand, .. } = parse("-(1 + 2)") else {
            panic!("expected a unary expression");
        };
        assert_eq!(op, UnaryOp::Negate);
        assert_eq!(operand.short_name(), "parens");

        let Expression::Binary { left, .. } = parse("-2 * 3") else {
            panic!("expected a binary expression");
        };
        assert_eq!(left.short_name(), "negation");
    }

    #[test]
    fn calls() {
        let expr = parse("setMissingValues(dataset(1), 0)");
        assert_eq!(expr.span(), 0..31);
        let Expression::Call { callee, args, .. } = expr else {
            panic!("expected a call");
        };
        assert_eq!(callee.name, "setMissingValues");
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].to_string(), "dataset(1)");

        let Expression::Call { args, .. } = parse("maxStreak()") else {
            panic!("expected a call");
        };
        assert!(args.is_empty());
    }

    #[test]
    fn error_mismatch_parens() {
        let error = Parser::new("(1").parse().unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Missing closing parenthesis");

        let error = Parser::new("max(dataset(0)").parse().unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::MissingParens { .. }));
    }

    #[test]
    fn error_empty_input() {
        let error = Parser::new("   ").parse().unwrap_err();
        insta::assert_snapshot!(
            error.to_string(),
            @"Expected primary expression, found end of input"
        );
    }

    #[test]
    fn error_trailing_input() {
        let error = Parser::new("1 2").parse().unwrap_err();
        insta::assert_snapshot!(
            error.to_string(),
            @"Unexpected number after the end of the expression"
        );
    }

    #[test]
    fn error_operator_without_operand() {
        let error = Parser::new("1 + * 2").parse().unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Expected primary expression, found `*`");
    }

    #[test]
    fn error_unknown_character() {
        let error = Parser::new("1 + #").parse().unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"Unrecognized character");
        assert_eq!(error.source_text(), "1 + #");
    }
}
