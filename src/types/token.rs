use super::expr::{BinaryOp, Literal, Scope};

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `$[path]`
    Path(String),
    /// `@[{g|s}name]`
    TempVar { scope: Scope, name: String },
    /// `&[{type}value]`
    Literal(Literal),
    /// `?[op]`: comparison or logical operator.
    LogicOp(BinaryOp),
    /// `#[op]`: arithmetic or assignment operator.
    MathOp(BinaryOp),
    /// `#[{name}`: start of a function call, closed by a bare `]`.
    FuncStart(String),
    LParen,
    RParen,
    RBracket,
    Eof,
}

/// A token with its source text and byte offsets into the normalized
/// expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, text: &str, start: usize) -> Self {
        Self {
            kind,
            text: text.to_owned(),
            start,
            end: start + text.len(),
        }
    }

    /// Text used when naming this token in an error message.
    pub(crate) fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_owned(),
            _ => format!("'{}'", self.text),
        }
    }
}
