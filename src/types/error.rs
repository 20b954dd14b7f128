use thiserror::Error;

use super::expr::BinaryOp;

/// Errors raised while evaluating an expression tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("undefined path '{path}'")]
    UndefinedPath { path: String },

    #[error("temp variable '{name}' is not set in the {scope} store")]
    UnsetVariable { scope: &'static str, name: String },

    #[error("cannot assign to '{target}'")]
    InvalidTarget { target: String },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: &'static str,
        found: usize,
    },

    #[error("function '{name}' argument {index} must be a number, got {type_name} {value}")]
    FunctionArgument {
        name: String,
        index: usize,
        type_name: &'static str,
        value: String,
    },

    #[error(
        "operator '{op}' requires numbers, got {left_type} {left} and {right_type} {right}"
    )]
    ArithmeticType {
        op: BinaryOp,
        left_type: &'static str,
        left: String,
        right_type: &'static str,
        right: String,
    },

    #[error("operator '{op}' cannot compare {left_type} with {right_type}")]
    ComparisonType {
        op: BinaryOp,
        left_type: &'static str,
        right_type: &'static str,
    },

    #[error("division by zero in '{op}'")]
    DivisionByZero { op: BinaryOp },

    #[error("'{op}' produced a non-finite number")]
    NonFinite { op: String },
}

/// A rule whose configuration cannot be executed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("rule does not match the rule schema: {reason}")]
    Malformed { reason: String },

    #[error("rule path is empty")]
    EmptyPath,

    #[error("{field} bounds must be finite, got [{min}, {max}]")]
    NonFiniteBounds {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("{field} bounds are inverted: [{min}, {max}]")]
    InvertedBounds {
        field: &'static str,
        min: f64,
        max: f64,
    },
}

/// Errors raised while decoding a rule set.
#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error("invalid rule set JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rule set must be a JSON object keyed by rule name")]
    NotAnObject,
}
