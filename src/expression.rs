use std::sync::Arc;

use serde_json::Value;

use crate::cache::AstCache;
use crate::correlate;
use crate::evaluate::{Evaluator, VariableStore};
use crate::parse::preprocess;
use crate::path;
use crate::types::config::{EngineConfig, MissingPath};
use crate::types::expr::{Expr, Target};
use crate::Error;

/// Result of evaluating one concrete expression.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalItem {
    /// Set when the root of the expression is an assignment.
    pub target: Option<Target>,
    /// The computed value. For assignments, the value written.
    pub value: Value,
    /// For data assignments, the value at the target before the write
    /// (`None` when the path did not exist).
    pub previous: Option<Value>,
}

/// Preprocess, correlate, parse (through the cache) and evaluate.
///
/// ```
/// use serde_json::json;
/// use sheet_rules::{EngineConfig, ExpressionEngine, VariableStore};
///
/// let mut engine = ExpressionEngine::new(&EngineConfig::default());
/// let mut data = json!({"a": {"x": 1}, "b": {"x": 1}});
/// let (mut globals, mut locals) = (VariableStore::new(), VariableStore::new());
///
/// let items = engine
///     .evaluate("$[*.x] #[=] $[*.x] #[+] &[{num}1]", &mut data, &mut globals, &mut locals)
///     .unwrap();
/// assert_eq!(items.len(), 2);
/// assert_eq!(data, json!({"a": {"x": 2}, "b": {"x": 2}}));
/// ```
#[derive(Debug)]
pub struct ExpressionEngine {
    cache: AstCache,
    missing_path: MissingPath,
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ExpressionEngine {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            cache: AstCache::new(config.cache_capacity),
            missing_path: config.missing_path,
        }
    }

    /// Evaluate `expression` once per wildcard context against `data`.
    ///
    /// Assignments write through to `data` and the variable stores as each
    /// concrete expression runs, so later contexts observe earlier writes.
    /// An expression whose wildcards match nothing evaluates to no items,
    /// after a syntax check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for malformed text and [`Error::Eval`] for the
    /// first failing concrete expression.
    pub fn evaluate(
        &mut self,
        expression: &str,
        data: &mut Value,
        globals: &mut VariableStore,
        locals: &mut VariableStore,
    ) -> Result<Vec<EvalItem>, Error> {
        let clean = preprocess(expression);
        let concrete = correlate::expand(data, &clean);
        if concrete.is_empty() {
            self.cache.get_or_parse(&clean)?;
            return Ok(Vec::new());
        }

        let mut items = Vec::with_capacity(concrete.len());
        for text in &concrete {
            let ast = self.cache.get_or_parse(text)?;
            items.push(self.run(&ast, data, globals, locals)?);
        }
        Ok(items)
    }

    fn run(
        &self,
        ast: &Arc<Expr>,
        data: &mut Value,
        globals: &mut VariableStore,
        locals: &mut VariableStore,
    ) -> Result<EvalItem, Error> {
        let target = ast.assignment_target();
        let previous = match &target {
            Some(Target::Data(p)) => path::get_dotted(data, p).cloned(),
            _ => None,
        };
        let value = Evaluator::new(data, globals, locals, self.missing_path).eval(ast)?;
        Ok(EvalItem {
            target,
            value,
            previous,
        })
    }

    #[must_use]
    pub fn cache(&self) -> &AstCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
