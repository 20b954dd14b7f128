mod error;
mod lexer;
mod parser;
mod preprocess;

pub use error::SyntaxError;
pub use lexer::tokenize;
pub use preprocess::preprocess;

use crate::types::expr::Expr;

/// Parse expression text into an [`Expr`].
///
/// The input is normalized with [`preprocess`] first, so error offsets refer
/// to the whitespace-stripped text.
///
/// # Errors
///
/// Returns [`SyntaxError`] if the input is not a well-formed expression.
pub fn parse(input: &str) -> Result<Expr, SyntaxError> {
    let normalized = preprocess(input);
    let tokens = tokenize(&normalized)?;
    parser::Parser::new(&tokens).parse()
}

/// Syntax-only check of an expression. No data is touched.
///
/// # Errors
///
/// Returns the first [`SyntaxError`] found.
pub fn validate(input: &str) -> Result<(), SyntaxError> {
    parse(input).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tolerates_whitespace() {
        let spaced = parse("<<op> $[hero.hp] #[=] #[{max} $[hero.hp] &[{num} 10] ] >").unwrap();
        let tight = parse("<<op>$[hero.hp]#[=]#[{max}$[hero.hp]&[{num}10]]>").unwrap();
        assert_eq!(spaced.to_string(), "(hero.hp = max(hero.hp, 10))");
        assert_eq!(tight.to_string(), "(hero.hp = max(hero.hp, 10))");
    }

    #[test]
    fn validate_reports_first_error() {
        assert!(validate("$[a] ?[==] &[{num}1]").is_ok());
        let err = validate("$[a.b").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("unclosed"));
        assert!(message.contains("offset 0"));
    }
}
