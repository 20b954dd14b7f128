use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value;

use crate::path;
use crate::types::config::MissingPath;
use crate::types::error::EvalError;
use crate::types::expr::{BinaryOp, Expr, Scope};
use crate::types::value::{compare_primitives, is_truthy, literal_value, loose_eq, number, type_name};

/// A temp-variable store, keyed by variable name.
pub type VariableStore = HashMap<String, Value>;

/// Tree-walking interpreter over the working data and the two variable
/// stores. Assignments write through immediately.
pub(crate) struct Evaluator<'a> {
    data: &'a mut Value,
    globals: &'a mut VariableStore,
    locals: &'a mut VariableStore,
    missing_path: MissingPath,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        data: &'a mut Value,
        globals: &'a mut VariableStore,
        locals: &'a mut VariableStore,
        missing_path: MissingPath,
    ) -> Self {
        Self {
            data,
            globals,
            locals,
            missing_path,
        }
    }

    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(lit) => Ok(literal_value(lit)),
            Expr::Path(p) => self.read_path(p),
            Expr::TempVar { scope, name } => self.read_var(*scope, name),
            Expr::Call { name, args } => self.call(name, args),
            Expr::Binary {
                op: BinaryOp::Assign,
                left,
                right,
            } => self.assign(left, right),
            Expr::Binary { op, left, right } => {
                let lhs = self.eval(left)?;
                let rhs = self.eval(right)?;
                binary(*op, lhs, rhs)
            }
        }
    }

    fn read_path(&self, p: &str) -> Result<Value, EvalError> {
        match path::get_dotted(&*self.data, p) {
            Some(value) => Ok(value.clone()),
            None => match self.missing_path {
                MissingPath::Error => Err(EvalError::UndefinedPath { path: p.to_owned() }),
                MissingPath::Null => Ok(Value::Null),
            },
        }
    }

    fn store(&mut self, scope: Scope) -> &mut VariableStore {
        match scope {
            Scope::Global => &mut *self.globals,
            Scope::Local => &mut *self.locals,
        }
    }

    fn read_var(&mut self, scope: Scope, name: &str) -> Result<Value, EvalError> {
        self.store(scope)
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnsetVariable {
                scope: scope_name(scope),
                name: name.to_owned(),
            })
    }

    fn assign(&mut self, target: &Expr, value: &Expr) -> Result<Value, EvalError> {
        let value = self.eval(value)?;
        match target {
            Expr::Path(p) => path::set_dotted(self.data, p, value.clone()),
            Expr::TempVar { scope, name } => {
                self.store(*scope).insert(name.clone(), value.clone());
            }
            other => {
                return Err(EvalError::InvalidTarget {
                    target: other.to_string(),
                })
            }
        }
        Ok(value)
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<Value, EvalError> {
        let Some(function) = Function::lookup(name) else {
            return Err(EvalError::UnknownFunction {
                name: name.to_owned(),
            });
        };
        let mut values = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let value = self.eval(arg)?;
            let n = value.as_f64().ok_or_else(|| EvalError::FunctionArgument {
                name: name.to_owned(),
                index: i + 1,
                type_name: type_name(&value),
                value: value.to_string(),
            })?;
            values.push(n);
        }
        let result = function.apply(name, &values)?;
        number(result).ok_or_else(|| EvalError::NonFinite {
            op: name.to_owned(),
        })
    }
}

fn scope_name(scope: Scope) -> &'static str {
    match scope {
        Scope::Global => "global",
        Scope::Local => "local",
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Or => Ok(if is_truthy(&left) { left } else { right }),
        BinaryOp::And => Ok(if is_truthy(&left) { right } else { left }),
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(&left, &right))),
        BinaryOp::Neq => Ok(Value::Bool(!loose_eq(&left, &right))),
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Lte | BinaryOp::Gte => {
            let ordering =
                compare_primitives(&left, &right).ok_or_else(|| EvalError::ComparisonType {
                    op,
                    left_type: type_name(&left),
                    right_type: type_name(&right),
                })?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Gt => ordering == Ordering::Greater,
                BinaryOp::Lte => ordering != Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::Assign => Ok(right),
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Mod
        | BinaryOp::Pow => arithmetic(op, &left, &right),
    }
}

/// `op` is one of the arithmetic operators; `**` takes the last arm.
fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(EvalError::ArithmeticType {
            op,
            left_type: type_name(left),
            left: left.to_string(),
            right_type: type_name(right),
            right: right.to_string(),
        });
    };
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => {
            return Err(EvalError::DivisionByZero { op });
        }
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        _ => a.powf(b),
    };
    number(result).ok_or_else(|| EvalError::NonFinite { op: op.to_string() })
}

/// Built-in numeric functions callable as `#[{name} args... ]`.
#[derive(Debug, Clone, Copy)]
enum Function {
    Unary(fn(f64) -> f64),
    Max,
    Min,
    Sum,
    Avg,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "ln" => Self::Unary(f64::ln),
            "log2" => Self::Unary(f64::log2),
            "sqrt" => Self::Unary(f64::sqrt),
            "abs" => Self::Unary(f64::abs),
            "floor" => Self::Unary(f64::floor),
            "ceil" => Self::Unary(f64::ceil),
            "neg" => Self::Unary(|x| -x),
            "max" => Self::Max,
            "min" => Self::Min,
            "sum" => Self::Sum,
            "avg" => Self::Avg,
            _ => return None,
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn apply(self, name: &str, args: &[f64]) -> Result<f64, EvalError> {
        let arity = |expected: &'static str| EvalError::Arity {
            name: name.to_owned(),
            expected,
            found: args.len(),
        };
        match self {
            Self::Unary(f) => match args {
                [x] => Ok(f(*x)),
                _ => Err(arity("exactly 1")),
            },
            Self::Max => args
                .iter()
                .copied()
                .reduce(f64::max)
                .ok_or_else(|| arity("at least 1")),
            Self::Min => args
                .iter()
                .copied()
                .reduce(f64::min)
                .ok_or_else(|| arity("at least 1")),
            Self::Sum => Ok(args.iter().sum()),
            Self::Avg if args.is_empty() => Ok(0.0),
            Self::Avg => Ok(args.iter().sum::<f64>() / args.len() as f64),
        }
    }
}
