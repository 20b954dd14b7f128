use thiserror::Error;

use crate::parse::SyntaxError;
use crate::types::error::{EvalError, RuleSetError};

/// Unified error type covering parsing, evaluation and rule-set decoding.
///
/// Returned by [`ExpressionEngine::evaluate`](crate::ExpressionEngine::evaluate)
/// and by the rule-set constructors in [`crate::apply_rules_json`].
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    RuleSet(#[from] RuleSetError),
}
