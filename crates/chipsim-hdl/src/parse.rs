use std::ops::Range;

use chipsim_core::ast::{Argument, Chip, ChipCall, Constant, Name, Value};
use chipsim_support::{LineInfo, Position};
use logos::{Lexer, Logos};
use thiserror::Error;

use crate::lex::Token;

#[derive(Error, Default, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[default]
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid integer")]
    InvalidInteger,
    #[error("expected {0}")]
    Expected(&'static str),
    #[error("unexpected `{0}`")]
    Unexpected(String),
    #[error("unexpected end of input")]
    UnexpectedEof,
}

/// A syntax error and where it was found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{position}: {kind}")]
pub struct Error {
    pub kind: ErrorKind,
    pub position: Position,
}

type ParseResult<T> = std::result::Result<T, Error>;

struct State<'input> {
    lexer: Lexer<'input, Token>,
    lines: LineInfo,
    /// The current token and its span. We support single token peeking.
    token: Option<(Result<Token, ErrorKind>, Range<usize>)>,
}

impl<'input> State<'input> {
    fn new(input: &'input str) -> State<'input> {
        let mut lexer = Token::lexer(input);
        let token = lexer.next().map(|token| (token, lexer.span()));
        State {
            lexer,
            lines: LineInfo::from_str(input),
            token,
        }
    }

    /// Peek at the current token.
    fn peek_token(&self) -> ParseResult<Option<Token>> {
        match &self.token {
            Some((Ok(token), _)) => Ok(Some(token.clone())),
            Some((Err(kind), _)) => Err(self.error(kind.clone())),
            None => Ok(None),
        }
    }

    /// Advance to the next token.
    fn advance_token(&mut self) {
        self.token = self.lexer.next().map(|token| (token, self.lexer.span()));
    }

    /// An error at the current token, or at the end of input.
    fn error(&self, kind: ErrorKind) -> Error {
        let offset = match &self.token {
            Some((_, span)) => span.start,
            None => self.lexer.source().len(),
        };
        Error {
            kind,
            position: self.lines.position(offset),
        }
    }

    /// An error for the current token when `what` was wanted.
    fn expected(&self, what: &'static str) -> Error {
        match &self.token {
            None => self.error(ErrorKind::UnexpectedEof),
            Some((Err(kind), _)) => self.error(kind.clone()),
            Some((Ok(_), _)) => self.error(ErrorKind::Expected(what)),
        }
    }
}

fn p_token_opt(state: &mut State, token: &Token) -> ParseResult<Option<()>> {
    if state.peek_token()?.as_ref() == Some(token) {
        state.advance_token();
        Ok(Some(()))
    } else {
        Ok(None)
    }
}

fn p_token(state: &mut State, token: &Token, what: &'static str) -> ParseResult<()> {
    match p_token_opt(state, token)? {
        Some(()) => Ok(()),
        None => Err(state.expected(what)),
    }
}

fn p_ident_opt(state: &mut State) -> ParseResult<Option<String>> {
    match state.peek_token()? {
        Some(Token::Ident(name)) => {
            state.advance_token();
            Ok(Some(name))
        }
        _ => Ok(None),
    }
}

fn p_ident(state: &mut State, what: &'static str) -> ParseResult<String> {
    match p_ident_opt(state)? {
        Some(name) => Ok(name),
        None => Err(state.expected(what)),
    }
}

fn p_number(state: &mut State) -> ParseResult<u32> {
    match state.peek_token()? {
        Some(Token::Number(value)) => {
            let value = u32::try_from(value).map_err(|_| state.error(ErrorKind::InvalidInteger))?;
            state.advance_token();
            Ok(value)
        }
        _ => Err(state.expected("a number")),
    }
}

/// `[a, b, ...] ;`, with `item` parsing each element.
fn p_list<T>(
    state: &mut State,
    what: &'static str,
    item: fn(&mut State) -> ParseResult<T>,
) -> ParseResult<Vec<T>> {
    let mut items = vec![item(state)?];
    while let Some(()) = p_token_opt(state, &Token::Comma)? {
        items.push(item(state)?);
    }
    p_token(state, &Token::Semicolon, what)?;
    Ok(items)
}

/// A declared pin: `a` or `a[16]`.
fn p_declaration(state: &mut State) -> ParseResult<Name> {
    let value = p_ident(state, "a pin name")?;
    if let Some(()) = p_token_opt(state, &Token::LBracket)? {
        let size = p_number(state)?;
        p_token(state, &Token::RBracket, "`]`")?;
        return Ok(Name::sized(value, size));
    }
    Ok(Name::simple(value))
}

fn p_simple(state: &mut State) -> ParseResult<Name> {
    Ok(Name::simple(p_ident(state, "a name")?))
}

/// A pin reference: `a`, `a[3]` or `a[0..7]`.
fn p_reference(state: &mut State) -> ParseResult<Name> {
    let value = p_ident(state, "a pin name")?;
    if p_token_opt(state, &Token::LBracket)?.is_none() {
        return Ok(Name::simple(value));
    }
    let from = p_number(state)?;
    let name = if let Some(()) = p_token_opt(state, &Token::DotDot)? {
        Name::ranged(value, from, p_number(state)?)
    } else {
        Name::indexed(value, from)
    };
    p_token(state, &Token::RBracket, "`]`")?;
    Ok(name)
}

fn p_value(state: &mut State) -> ParseResult<Value> {
    let constant = match state.peek_token()? {
        Some(Token::True) => Constant::TRUE,
        Some(Token::False) => Constant::FALSE,
        Some(Token::Number(value)) => Constant::new(value),
        Some(Token::Ident(_)) => return Ok(Value::Name(p_reference(state)?)),
        _ => return Err(state.expected("a pin or a constant")),
    };
    state.advance_token();
    Ok(Value::Constant(constant))
}

fn p_argument(state: &mut State) -> ParseResult<Argument> {
    let name = p_reference(state)?;
    p_token(state, &Token::Equals, "`=`")?;
    let value = p_value(state)?;
    Ok(Argument::new(name, value))
}

/// `Part(a=b, ...);`
fn p_part_opt(state: &mut State) -> ParseResult<Option<ChipCall>> {
    let Some(name) = p_ident_opt(state)? else {
        return Ok(None);
    };
    p_token(state, &Token::LParen, "`(`")?;
    let mut arguments = Vec::new();
    if p_token_opt(state, &Token::RParen)?.is_none() {
        arguments.push(p_argument(state)?);
        while let Some(()) = p_token_opt(state, &Token::Comma)? {
            arguments.push(p_argument(state)?);
        }
        p_token(state, &Token::RParen, "`,` or `)`")?;
    }
    p_token(state, &Token::Semicolon, "`;`")?;
    Ok(Some(ChipCall::new(name, arguments)))
}

fn p_chip(state: &mut State) -> ParseResult<Chip> {
    p_token(state, &Token::Chip, "`CHIP`")?;
    let name = p_ident(state, "a chip name")?;
    p_token(state, &Token::LBrace, "`{`")?;

    let mut chip = Chip::new(name, Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new());
    loop {
        match state.peek_token()? {
            Some(Token::In) => {
                state.advance_token();
                chip.inputs.extend(p_list(state, "`,` or `;`", p_declaration)?);
            }
            Some(Token::Out) => {
                state.advance_token();
                chip.outputs.extend(p_list(state, "`,` or `;`", p_declaration)?);
            }
            Some(Token::Parts) => {
                state.advance_token();
                p_token(state, &Token::Colon, "`:`")?;
                while let Some(part) = p_part_opt(state)? {
                    chip.parts.push(part);
                }
            }
            Some(Token::Builtin) => {
                state.advance_token();
                chip.builtins.extend(p_list(state, "`,` or `;`", p_simple)?);
            }
            Some(Token::Clocked) => {
                state.advance_token();
                chip.clocked.extend(p_list(state, "`,` or `;`", p_simple)?);
            }
            Some(Token::RBrace) => {
                state.advance_token();
                break;
            }
            Some(token) => {
                return Err(state.error(ErrorKind::Unexpected(token.to_string())));
            }
            None => return Err(state.error(ErrorKind::UnexpectedEof)),
        }
    }

    match state.peek_token()? {
        None => Ok(chip),
        Some(token) => Err(state.error(ErrorKind::Unexpected(token.to_string()))),
    }
}

/// Parse one chip definition.
pub fn parse(input: &str) -> Result<Chip, Error> {
    p_chip(&mut State::new(input))
}
