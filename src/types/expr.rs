use std::fmt;

/// Binary operators, from assignment (lowest precedence) to power (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Assign,
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    /// Operators accepted inside `?[...]`.
    #[must_use]
    pub fn from_logic_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "==" => Self::Eq,
            "!=" => Self::Neq,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::Lte,
            ">=" => Self::Gte,
            "&&" => Self::And,
            "||" => Self::Or,
            _ => return None,
        })
    }

    /// Operators accepted inside `#[...]`.
    #[must_use]
    pub fn from_math_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Mod,
            "**" => Self::Pow,
            "=" => Self::Assign,
            _ => return None,
        })
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Or => "||",
            Self::And => "&&",
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Gte => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "**",
        }
    }

    #[must_use]
    pub fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Gt | Self::Lte | Self::Gte)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Which temp-variable store a variable lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// `@[{g}name]`: lives for a whole rule-set application.
    Global,
    /// `@[{s}name]`: reset at the start of every rule.
    Local,
}

impl Scope {
    #[must_use]
    pub fn tag(self) -> char {
        match self {
            Scope::Global => 'g',
            Scope::Local => 's',
        }
    }
}

/// A typed literal produced by `&[{type}value]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// Expression AST.
///
/// Paths are kept as their raw dotted text; wildcard substitution happens on
/// the expression string before parsing, so every path reaching the
/// evaluator is concrete.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Path(String),
    TempVar {
        scope: Scope,
        name: String,
    },
    Literal(Literal),
}

impl Expr {
    #[must_use]
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Returns `true` for nodes that may appear on the left of `#[=]`.
    #[must_use]
    pub fn is_assignable(&self) -> bool {
        matches!(self, Expr::Path(_) | Expr::TempVar { .. })
    }

    /// The write target when the root of this tree is an assignment.
    #[must_use]
    pub fn assignment_target(&self) -> Option<Target> {
        match self {
            Expr::Binary {
                op: BinaryOp::Assign,
                left,
                ..
            } => match left.as_ref() {
                Expr::Path(path) => Some(Target::Data(path.clone())),
                Expr::TempVar { scope, name } => Some(Target::Temp(temp_label(*scope, name))),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Where an assignment wrote its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A dotted path in the state tree.
    Data(String),
    /// A temp variable, labelled `@(g)name` or `@(s)name`.
    Temp(String),
}

pub(crate) fn temp_label(scope: Scope, name: &str) -> String {
    format!("@({}){name}", scope.tag())
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Number(v) => write!(f, "{v}"),
            Literal::String(v) => write!(f, "\"{v}\""),
        }
    }
}

/// Human-readable rendering: paths lose their `$[...]` wrapper, operators
/// lose their sigils and calls read as `name(args)`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Path(path) => write!(f, "{path}"),
            Expr::TempVar { scope, name } => write!(f, "{}", temp_label(*scope, name)),
            Expr::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_round_trip_through_lookup() {
        for op in [BinaryOp::Eq, BinaryOp::Lte, BinaryOp::And, BinaryOp::Or] {
            assert_eq!(BinaryOp::from_logic_symbol(op.symbol()), Some(op));
        }
        for op in [BinaryOp::Add, BinaryOp::Pow, BinaryOp::Assign, BinaryOp::Mod] {
            assert_eq!(BinaryOp::from_math_symbol(op.symbol()), Some(op));
        }
        assert_eq!(BinaryOp::from_logic_symbol("+"), None);
        assert_eq!(BinaryOp::from_math_symbol("=="), None);
    }

    #[test]
    fn assignment_target_for_path_and_temp() {
        let data = Expr::binary(
            BinaryOp::Assign,
            Expr::Path("stat.hp".into()),
            Expr::Literal(Literal::Number(1.0)),
        );
        assert_eq!(
            data.assignment_target(),
            Some(Target::Data("stat.hp".into()))
        );

        let temp = Expr::binary(
            BinaryOp::Assign,
            Expr::TempVar {
                scope: Scope::Global,
                name: "counter".into(),
            },
            Expr::Literal(Literal::Number(1.0)),
        );
        assert_eq!(
            temp.assignment_target(),
            Some(Target::Temp("@(g)counter".into()))
        );
    }

    #[test]
    fn non_assignment_has_no_target() {
        let expr = Expr::binary(
            BinaryOp::Add,
            Expr::Path("a".into()),
            Expr::Literal(Literal::Number(1.0)),
        );
        assert_eq!(expr.assignment_target(), None);
    }

    #[test]
    fn display_reads_like_infix() {
        let expr = Expr::binary(
            BinaryOp::Assign,
            Expr::Path("hero.hp".into()),
            Expr::Call {
                name: "max".into(),
                args: vec![
                    Expr::Path("hero.hp".into()),
                    Expr::Literal(Literal::Number(10.0)),
                ],
            },
        );
        assert_eq!(expr.to_string(), "(hero.hp = max(hero.hp, 10))");
        assert_eq!(
            Expr::Literal(Literal::String("hi".into())).to_string(),
            "\"hi\""
        );
    }
}
