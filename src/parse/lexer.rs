use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, terminated};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

use crate::types::expr::{BinaryOp, Literal, Scope};
use crate::types::token::{Token, TokenKind};

use super::error::SyntaxError;

// -- Payload grammars -------------------------------------------------------

fn wrapper_header<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    delimited("<<", alt(("if", "op")), ('>', multispace0)).parse_next(input)
}

fn filler<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(0.., |c: char| c.is_whitespace() || c == '>').parse_next(input)
}

fn open_bracket(input: &mut &str) -> ModalResult<char> {
    '['.parse_next(input)
}

fn bracket_payload<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    terminated(take_till(0.., ']'), ']').parse_next(input)
}

fn function_name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    delimited('{', take_till(0.., '}'), '}').parse_next(input)
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn temp_variable(input: &mut &str) -> ModalResult<(Scope, String)> {
    let scope = delimited('{', one_of(['g', 's']), '}')
        .map(|c| if c == 'g' { Scope::Global } else { Scope::Local })
        .parse_next(input)?;
    let name = take_while(1.., is_word).parse_next(input)?;
    Ok((scope, name.to_owned()))
}

fn literal_tag<'i>(input: &mut &'i str) -> ModalResult<Option<&'i str>> {
    opt(delimited('{', take_while(1.., is_word), '}')).parse_next(input)
}

/// Numbers use Rust's float grammar, so `+5`, `1e3` and `.5` parse. The whole
/// payload must be numeric (`12abc` does not parse) and `inf`/`NaN` are rejected.
fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Decode the payload of `&[...]` into a typed literal.
fn literal(payload: &str, offset: usize) -> Result<Literal, SyntaxError> {
    let mut rest = payload;
    let tag = literal_tag.parse_next(&mut rest).ok().flatten();
    let Some(tag) = tag else {
        return Ok(parse_number(payload).map_or_else(
            || Literal::String(payload.to_owned()),
            Literal::Number,
        ));
    };
    Ok(match tag {
        "num" => Literal::Number(parse_number(rest).ok_or_else(|| SyntaxError::InvalidNumber {
            payload: rest.to_owned(),
            offset,
        })?),
        "str" => Literal::String(rest.to_owned()),
        "bool" => Literal::Bool(rest == "true"),
        "null" => Literal::Null,
        _ => Literal::String(rest.to_owned()),
    })
}

// -- Driver -----------------------------------------------------------------

struct Cursor<'i> {
    source: &'i str,
    rest: &'i str,
}

impl<'i> Cursor<'i> {
    fn offset(&self) -> usize {
        self.source.len() - self.rest.len()
    }

    fn bump(&mut self, ch: char) {
        self.rest = &self.rest[ch.len_utf8()..];
    }

    /// Consume `[payload]` after a sigil that has already been bumped.
    fn bracketed(
        &mut self,
        sigil: char,
        construct: &'static str,
        start: usize,
    ) -> Result<&'i str, SyntaxError> {
        open_bracket
            .parse_next(&mut self.rest)
            .map_err(|_| SyntaxError::ExpectedBracket {
                sigil,
                offset: start,
            })?;
        bracket_payload
            .parse_next(&mut self.rest)
            .map_err(|_| SyntaxError::Unclosed {
                construct,
                offset: start,
            })
    }

    fn hash(&mut self, start: usize) -> Result<TokenKind, SyntaxError> {
        open_bracket
            .parse_next(&mut self.rest)
            .map_err(|_| SyntaxError::ExpectedBracket {
                sigil: '#',
                offset: start,
            })?;
        if self.rest.starts_with('{') {
            let name = function_name
                .parse_next(&mut self.rest)
                .map_err(|_| SyntaxError::Unclosed {
                    construct: "function name",
                    offset: start,
                })?;
            return Ok(TokenKind::FuncStart(name.to_owned()));
        }
        let op = bracket_payload
            .parse_next(&mut self.rest)
            .map_err(|_| SyntaxError::Unclosed {
                construct: "operator",
                offset: start,
            })?;
        BinaryOp::from_math_symbol(op)
            .map(TokenKind::MathOp)
            .ok_or_else(|| SyntaxError::UnknownOperator {
                op: op.to_owned(),
                offset: start,
            })
    }

    fn next_kind(&mut self, ch: char, start: usize) -> Result<TokenKind, SyntaxError> {
        self.bump(ch);
        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ']' => TokenKind::RBracket,
            '$' => TokenKind::Path(self.bracketed('$', "path reference", start)?.to_owned()),
            '@' => {
                let payload = self.bracketed('@', "temp variable", start)?;
                let (scope, name) =
                    temp_variable
                        .parse(payload)
                        .map_err(|_| SyntaxError::InvalidTempVariable {
                            payload: payload.to_owned(),
                            offset: start,
                        })?;
                TokenKind::TempVar { scope, name }
            }
            '&' => {
                let payload = self.bracketed('&', "literal", start)?;
                TokenKind::Literal(literal(payload, start)?)
            }
            '?' => {
                let op = self.bracketed('?', "operator", start)?;
                BinaryOp::from_logic_symbol(op)
                    .map(TokenKind::LogicOp)
                    .ok_or_else(|| SyntaxError::UnknownOperator {
                        op: op.to_owned(),
                        offset: start,
                    })?
            }
            '#' => self.hash(start)?,
            other => {
                return Err(SyntaxError::UnexpectedChar {
                    ch: other,
                    offset: start,
                })
            }
        };
        Ok(kind)
    }
}

/// Split an expression into tokens. The stream always ends with
/// [`TokenKind::Eof`].
///
/// # Errors
///
/// Returns [`SyntaxError`] for stray characters, malformed bracket forms and
/// unknown operators.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut cursor = Cursor {
        source,
        rest: source,
    };
    let _ = opt(wrapper_header).parse_next(&mut cursor.rest);

    let mut tokens = Vec::new();
    loop {
        let _ = filler.parse_next(&mut cursor.rest);
        let start = cursor.offset();
        let Some(ch) = cursor.rest.chars().next() else {
            break;
        };
        let kind = cursor.next_kind(ch, start)?;
        tokens.push(Token::new(kind, &source[start..cursor.offset()], start));
    }
    tokens.push(Token::new(TokenKind::Eof, "", source.len()));
    Ok(tokens)
}
