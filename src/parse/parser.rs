use crate::types::expr::{BinaryOp, Expr};
use crate::types::token::{Token, TokenKind};

use super::error::SyntaxError;

/// Recursive-descent parser over a token stream.
///
/// Precedence, lowest first: `=` (right-assoc), `||`, `&&`, comparisons,
/// `+ -`, `* / %`, `**` (right-assoc), primary.
pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub(crate) fn parse(mut self) -> Result<Expr, SyntaxError> {
        if self.at_end() {
            return Err(SyntaxError::Empty);
        }
        let expr = self.expression()?;
        if !self.at_end() {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    // -- Token helpers --------------------------------------------------------

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn at_end(&self) -> bool {
        self.peek().map_or(true, |t| t.kind == TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.peek()?;
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        Some(token)
    }

    fn end_offset(&self) -> usize {
        self.tokens.last().map_or(0, |t| t.start)
    }

    fn unexpected(&self) -> SyntaxError {
        match self.peek() {
            Some(token) if token.kind != TokenKind::Eof => SyntaxError::UnexpectedToken {
                token: token.describe(),
                offset: token.start,
            },
            _ => SyntaxError::UnexpectedEnd {
                offset: self.end_offset(),
            },
        }
    }

    /// Consume the next token when it is an operator accepted by `accept`.
    fn binary_op(&mut self, accept: impl Fn(&TokenKind) -> Option<BinaryOp>) -> Option<BinaryOp> {
        let op = self.peek().and_then(|t| accept(&t.kind))?;
        self.pos += 1;
        Some(op)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(token) if token.kind == *kind => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.unexpected()),
        }
    }

    // -- Precedence levels ----------------------------------------------------

    fn expression(&mut self) -> Result<Expr, SyntaxError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, SyntaxError> {
        let target = self.logical_or()?;
        let Some(token) = self.peek() else {
            return Ok(target);
        };
        if token.kind != TokenKind::MathOp(BinaryOp::Assign) {
            return Ok(target);
        }
        self.pos += 1;
        let value = self.assignment()?;
        if !target.is_assignable() {
            return Err(SyntaxError::InvalidAssignmentTarget {
                offset: token.start,
            });
        }
        Ok(Expr::binary(BinaryOp::Assign, target, value))
    }

    fn logical_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut node = self.logical_and()?;
        while let Some(op) = self.binary_op(|k| match k {
            TokenKind::LogicOp(BinaryOp::Or) => Some(BinaryOp::Or),
            _ => None,
        }) {
            node = Expr::binary(op, node, self.logical_and()?);
        }
        Ok(node)
    }

    fn logical_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut node = self.comparison()?;
        while let Some(op) = self.binary_op(|k| match k {
            TokenKind::LogicOp(BinaryOp::And) => Some(BinaryOp::And),
            _ => None,
        }) {
            node = Expr::binary(op, node, self.comparison()?);
        }
        Ok(node)
    }

    fn comparison(&mut self) -> Result<Expr, SyntaxError> {
        let mut node = self.additive()?;
        while let Some(op) = self.binary_op(|k| match k {
            TokenKind::LogicOp(op @ (BinaryOp::Eq | BinaryOp::Neq)) => Some(*op),
            TokenKind::LogicOp(op) if op.is_ordering() => Some(*op),
            _ => None,
        }) {
            node = Expr::binary(op, node, self.additive()?);
        }
        Ok(node)
    }

    fn additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut node = self.multiplicative()?;
        while let Some(op) = self.binary_op(|k| match k {
            TokenKind::MathOp(op @ (BinaryOp::Add | BinaryOp::Sub)) => Some(*op),
            _ => None,
        }) {
            node = Expr::binary(op, node, self.multiplicative()?);
        }
        Ok(node)
    }

    fn multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut node = self.power()?;
        while let Some(op) = self.binary_op(|k| match k {
            TokenKind::MathOp(op @ (BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod)) => Some(*op),
            _ => None,
        }) {
            node = Expr::binary(op, node, self.power()?);
        }
        Ok(node)
    }

    fn power(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.primary()?;
        if self
            .binary_op(|k| match k {
                TokenKind::MathOp(BinaryOp::Pow) => Some(BinaryOp::Pow),
                _ => None,
            })
            .is_some()
        {
            let exponent = self.power()?;
            return Ok(Expr::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        if self.at_end() {
            return Err(self.unexpected());
        }
        let Some(token) = self.advance() else {
            return Err(self.unexpected());
        };
        match &token.kind {
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Path(path) => Ok(Expr::Path(path.clone())),
            TokenKind::TempVar { scope, name } => Ok(Expr::TempVar {
                scope: *scope,
                name: name.clone(),
            }),
            TokenKind::Literal(lit) => Ok(Expr::Literal(lit.clone())),
            TokenKind::FuncStart(name) => {
                let mut args = Vec::new();
                while !self.at_end()
                    && self.peek().is_some_and(|t| t.kind != TokenKind::RBracket)
                {
                    args.push(self.expression()?);
                }
                self.expect(&TokenKind::RBracket)?;
                Ok(Expr::Call {
                    name: name.clone(),
                    args,
                })
            }
            _ => Err(SyntaxError::UnexpectedToken {
                token: token.describe(),
                offset: token.start,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parse::lexer::tokenize;
    use crate::types::expr::{Literal, Scope};

    use super::*;

    fn parse(source: &str) -> Result<Expr, SyntaxError> {
        let tokens = tokenize(source)?;
        Parser::new(&tokens).parse()
    }

    fn num(n: f64) -> Expr {
        Expr::Literal(Literal::Number(n))
    }

    fn path(p: &str) -> Expr {
        Expr::Path(p.into())
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse("&[1]#[+]&[2]#[*]&[3]").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Add,
                num(1.0),
                Expr::binary(BinaryOp::Mul, num(2.0), num(3.0))
            )
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        let expr = parse("&[5]#[-]&[2]#[-]&[1]").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Sub,
                Expr::binary(BinaryOp::Sub, num(5.0), num(2.0)),
                num(1.0)
            )
        );
    }

    #[test]
    fn power_is_right_associative() {
        let expr = parse("&[2]#[**]&[3]#[**]&[2]").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Pow,
                num(2.0),
                Expr::binary(BinaryOp::Pow, num(3.0), num(2.0))
            )
        );
    }

    #[test]
    fn assignment_is_right_associative_and_lowest() {
        let expr = parse("$[a]#[=]$[b]#[=]$[c]#[+]&[1]").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Assign,
                path("a"),
                Expr::binary(
                    BinaryOp::Assign,
                    path("b"),
                    Expr::binary(BinaryOp::Add, path("c"), num(1.0))
                )
            )
        );
    }

    #[test]
    fn logic_precedence() {
        let expr = parse("$[a]?[||]$[b]?[&&]$[c]?[>]&[1]").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Or,
                path("a"),
                Expr::binary(
                    BinaryOp::And,
                    path("b"),
                    Expr::binary(BinaryOp::Gt, path("c"), num(1.0))
                )
            )
        );
    }

    #[test]
    fn parentheses_group() {
        let expr = parse("($[a]#[+]&[1])#[*]&[2]").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Mul,
                Expr::binary(BinaryOp::Add, path("a"), num(1.0)),
                num(2.0)
            )
        );
    }

    #[test]
    fn function_with_expression_arguments() {
        let expr = parse("#[{max}$[a]#[+]&[1]&[10]]").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                name: "max".into(),
                args: vec![Expr::binary(BinaryOp::Add, path("a"), num(1.0)), num(10.0)],
            }
        );
    }

    #[test]
    fn nested_function_calls() {
        let expr = parse("#[{abs}#[{min}$[a]$[b]]]").unwrap();
        let Expr::Call { name, args } = expr else {
            panic!("expected call");
        };
        assert_eq!(name, "abs");
        assert!(matches!(&args[0], Expr::Call { name, args } if name == "min" && args.len() == 2));
    }

    #[test]
    fn temp_variable_assignment() {
        let expr = parse("@[{g}n]#[=]&[{num}1]").unwrap();
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Assign,
                Expr::TempVar {
                    scope: Scope::Global,
                    name: "n".into()
                },
                num(1.0)
            )
        );
    }

    #[test]
    fn invalid_assignment_target() {
        assert_eq!(
            parse("&[1]#[=]&[2]"),
            Err(SyntaxError::InvalidAssignmentTarget { offset: 4 })
        );
    }

    #[test]
    fn empty_expression() {
        assert_eq!(parse(""), Err(SyntaxError::Empty));
        assert_eq!(parse("<<op>>"), Err(SyntaxError::Empty));
    }

    #[test]
    fn leftover_tokens() {
        assert_eq!(
            parse("$[a]$[b]"),
            Err(SyntaxError::UnexpectedToken {
                token: "'$[b]'".into(),
                offset: 4
            })
        );
    }

    #[test]
    fn premature_end() {
        assert_eq!(
            parse("$[a]#[+]"),
            Err(SyntaxError::UnexpectedEnd { offset: 8 })
        );
        assert_eq!(
            parse("($[a]"),
            Err(SyntaxError::UnexpectedEnd { offset: 5 })
        );
        assert_eq!(
            parse("#[{max}$[a]"),
            Err(SyntaxError::UnexpectedEnd { offset: 11 })
        );
    }

    #[test]
    fn stray_closing_paren() {
        assert!(matches!(
            parse(")"),
            Err(SyntaxError::UnexpectedToken { offset: 0, .. })
        ));
    }
}
