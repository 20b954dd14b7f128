//! A rule engine that mutates schema-less JSON state trees.
//!
//! Rules are written in a bracketed expression language (`$[path]`,
//! `@[{g}var]`, `&[{num}1]`, `#[+]`, `?[<]`, `#[{max}...]`) and run against a
//! working copy of the data merged onto a snapshot. The result is the diff
//! against the snapshot plus a structured log.
//!
//! ```
//! use serde_json::json;
//! use sheet_rules::apply_rules_json;
//!
//! let rules = r#"{
//!     "regen": {
//!         "path": "party.*.hp",
//!         "range": [0, 100],
//!         "handle": { "tick": { "op": "$[party.*.hp] #[=] $[party.*.hp] #[+] &[{num}30]" } }
//!     }
//! }"#;
//! let snapshot = json!({"party": {"ann": {"hp": 50}, "bob": {"hp": 90}}});
//!
//! let outcome = apply_rules_json(&snapshot, &snapshot, rules).unwrap();
//! assert_eq!(outcome.data, json!({"party": {"ann": {"hp": 80}, "bob": {"hp": 100}}}));
//! ```

mod apply;
mod cache;
pub mod correlate;
mod diff;
mod error;
mod evaluate;
mod expression;
pub mod parse;
mod path;
mod types;

pub use apply::{apply_rules, apply_rules_json, ApplyOutcome, RuleEngine};
pub use cache::{AstCache, DEFAULT_CACHE_CAPACITY};
pub use diff::{diff, merge_into_snapshot};
pub use error::Error;
pub use evaluate::VariableStore;
pub use expression::{EvalItem, ExpressionEngine};
pub use parse::{parse, preprocess, tokenize, validate, SyntaxError};
pub use types::{
    compare_primitives, is_truthy, loose_eq, number, type_name, BinaryOp, Change, EngineConfig,
    EvalError, Expr, Handle, HandleBuilder, Literal, LogAction, LogEntry, MissingPath, Rule,
    RuleBuilder, RuleError, RuleLog, RuleSet, RuleSetBuilder, RuleSetError, Scope, Target, Token,
    TokenKind, GLOBAL_PATH,
};
