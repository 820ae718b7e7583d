use std::fmt;
use std::num::ParseIntError;

use logos::Logos;

use crate::parse::ErrorKind;

impl From<ParseIntError> for ErrorKind {
    fn from(_: ParseIntError) -> Self {
        ErrorKind::InvalidInteger
    }
}

#[derive(Logos, Clone, Debug, Eq, PartialEq, Hash)]
#[logos(error = ErrorKind)]
// Whitespace
#[logos(skip r"[ \t\r\n\f]+")]
// Comments
#[logos(skip r"//[^\r\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    #[token("CHIP")]
    Chip,
    #[token("IN")]
    In,
    #[token("OUT")]
    Out,
    #[token("PARTS")]
    Parts,
    #[token("BUILTIN")]
    Builtin,
    #[token("CLOCKED")]
    Clocked,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("=")]
    Equals,
    #[token("..")]
    DotDot,
    #[regex(r"[0-9]+", |lex| lex.slice().parse())]
    Number(i64),
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "{value}"),
            Token::Ident(name) => write!(f, "{name}"),
            token => write!(f, "{token:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Result<Token, ErrorKind>> {
        Token::lexer(input).collect()
    }

    #[test]
    fn test_keywords_and_idents() {
        assert_eq!(
            tokens("CHIP CHIPS In IN"),
            [
                Ok(Token::Chip),
                Ok(Token::Ident("CHIPS".to_owned())),
                Ok(Token::Ident("In".to_owned())),
                Ok(Token::In),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let input = "/** doc\n * more */ a // line\n/* x */ b";
        assert_eq!(
            tokens(input),
            [
                Ok(Token::Ident("a".to_owned())),
                Ok(Token::Ident("b".to_owned())),
            ]
        );
    }

    #[test]
    fn test_ranges() {
        assert_eq!(
            tokens("a[0..7]"),
            [
                Ok(Token::Ident("a".to_owned())),
                Ok(Token::LBracket),
                Ok(Token::Number(0)),
                Ok(Token::DotDot),
                Ok(Token::Number(7)),
                Ok(Token::RBracket),
            ]
        );
    }

    #[test]
    fn test_bad_input() {
        assert_eq!(tokens("#"), [Err(ErrorKind::InvalidToken)]);
        assert_eq!(
            tokens("99999999999999999999"),
            [Err(ErrorKind::InvalidInteger)]
        );
    }
}
