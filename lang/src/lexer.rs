use logos::Logos;
use std::num::ParseFloatError;

#[derive(Clone, Debug, Default, thiserror::Error, PartialEq, Eq)]
pub enum LexingError {
    #[default]
    #[error("Unrecognized character")]
    Other,

    #[error(transparent)]
    NumberError(#[from] ParseFloatError),
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(error = LexingError)]
#[logos(skip r"[ \t\r\n\f]+")] // Ignore this regex pattern between tokens
pub enum Token<'a> {
    // Unary/Binary operators
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("/")]
    Slash,
    #[token("*")]
    Star,
    #[token("%")]
    Percent,

    // Parens
    #[token("(")]
    LeftParens,
    #[token(")")]
    RightParens,

    // Misc
    #[token(",")]
    Comma,

    #[token("true", |_| true)]
    #[token("false", |_| false)]
    Bool(bool),
    #[regex(r#""[^"]*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    #[regex(r#"'[^']*'"#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    String(&'a str),
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice())]
    Ident(&'a str),
    // The sign is never part of the number, `-` is always an operator.
    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse())]
    Number(f64),
}

impl Token<'_> {
    pub fn short_name(&self) -> &'static str {
        match self {
            Token::Minus => "`-`",
            Token::Plus => "`+`",
            Token::Slash => "`/`",
            Token::Star => "`*`",
            Token::Percent => "`%`",
            Token::LeftParens => "`(`",
            Token::RightParens => "`)`",
            Token::Comma => "`,`",
            Token::Bool(_) => "boolean",
            Token::String(_) => "string",
            Token::Ident(_) => "identifier",
            Token::Number(_) => "number",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identifier() {
        for ident in [
            "dataset",
            "maxStreak",
            "maxStreak(",
            "numDaysHavingData",
            "min ",
            "_hello",
            "he_llo",
            "tamo_du_30",
        ] {
            let mut lex = Token::lexer(ident);

            assert_eq!(lex.next(), Some(Ok(Token::Ident(lex.slice()))));
            assert!(ident.starts_with(lex.slice()));
        }
    }

    #[test]
    fn keyword_prefix_stays_an_identifier() {
        let mut lex = Token::lexer("trueish");
        assert_eq!(lex.next(), Some(Ok(Token::Ident("trueish"))));

        let mut lex = Token::lexer("false");
        assert_eq!(lex.next(), Some(Ok(Token::Bool(false))));
    }

    #[test]
    fn number() {
        for (ident, ret) in [("0", 0.0), ("123456789", 123456789.0), ("123.123", 123.123)] {
            let mut lex = Token::lexer(ident);

            assert!(
                matches!(lex.next(), Some(Ok(Token::Number(n))) if n == ret),
                "error on {}",
                lex.slice()
            );
            assert!(ident.starts_with(lex.slice()));
        }
    }

    #[test]
    fn minus_is_never_glued_to_a_number() {
        let tokens: Vec<_> = Token::lexer("5-3").collect();
        assert_eq!(
            tokens,
            vec![Ok(Token::Number(5.0)), Ok(Token::Minus), Ok(Token::Number(3.0))]
        );
    }

    #[test]
    fn strings() {
        let mut lex = Token::lexer(r#""hello world" 'single'"#);
        assert_eq!(lex.next(), Some(Ok(Token::String("hello world"))));
        assert_eq!(lex.next(), Some(Ok(Token::String("single"))));
        assert_eq!(lex.next(), None);
    }

    #[test]
    fn operators() {
        for (ident, ret) in [
            ("-", Token::Minus),
            ("+", Token::Plus),
            ("/", Token::Slash),
            ("*", Token::Star),
            ("%", Token::Percent),
            ("(", Token::LeftParens),
            (")", Token::RightParens),
            (",", Token::Comma),
        ] {
            let mut lex = Token::lexer(ident);

            assert_eq!(lex.next(), Some(Ok(ret)));
            assert!(ident.starts_with(lex.slice()));
        }
    }

    #[test]
    fn unknown_character() {
        let mut lex = Token::lexer("#");
        assert_eq!(lex.next(), Some(Err(LexingError::Other)));
    }

    #[test]
    fn summary_expression() {
        let input = r###"
dataset(0) * 2 + max(dataset(1)) % 3
        "###;
        let lex = Token::lexer(input);

        for token in lex {
            assert!(token.is_ok());
        }
    }
}
