use thiserror::Error;

/// Errors produced while lexing or parsing an expression.
///
/// Offsets are byte offsets into the normalized (whitespace-stripped)
/// expression text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("empty expression")]
    Empty,

    #[error("expected '[' after '{sigil}' at offset {offset}")]
    ExpectedBracket { sigil: char, offset: usize },

    #[error("unclosed {construct} at offset {offset}")]
    Unclosed {
        construct: &'static str,
        offset: usize,
    },

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("invalid temp variable '@[{payload}]' at offset {offset}")]
    InvalidTempVariable { payload: String, offset: usize },

    #[error("invalid number literal '{payload}' at offset {offset}")]
    InvalidNumber { payload: String, offset: usize },

    #[error("unknown operator '{op}' at offset {offset}")]
    UnknownOperator { op: String, offset: usize },

    #[error("unexpected token {token} at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },

    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("invalid assignment target at offset {offset}: must be a path or a temp variable")]
    InvalidAssignmentTarget { offset: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unclosed_display() {
        let err = SyntaxError::Unclosed {
            construct: "path reference",
            offset: 0,
        };
        assert_eq!(err.to_string(), "unclosed path reference at offset 0");
    }

    #[test]
    fn unexpected_char_display() {
        let err = SyntaxError::UnexpectedChar { ch: '%', offset: 4 };
        assert_eq!(err.to_string(), "unexpected character '%' at offset 4");
    }
}
