pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod expr;
pub(crate) mod log;
pub(crate) mod rule;
pub(crate) mod token;
pub(crate) mod value;

pub use config::{EngineConfig, MissingPath};
pub use error::{EvalError, RuleError, RuleSetError};
pub use expr::{BinaryOp, Expr, Literal, Scope, Target};
pub use log::{Change, LogAction, LogEntry, RuleLog};
pub use rule::{Handle, HandleBuilder, Rule, RuleBuilder, RuleSet, RuleSetBuilder, GLOBAL_PATH};
pub use token::{Token, TokenKind};
pub use value::{compare_primitives, is_truthy, loose_eq, number, type_name};
