use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::correlate::{self, Context};
use crate::diff::{diff, merge_into_snapshot};
use crate::evaluate::VariableStore;
use crate::expression::{EvalItem, ExpressionEngine};
use crate::parse::preprocess;
use crate::path;
use crate::types::config::EngineConfig;
use crate::types::error::RuleError;
use crate::types::expr::Target;
use crate::types::log::{LogAction, LogEntry, RuleLog};
use crate::types::rule::{Handle, Rule, RuleSet};
use crate::types::value::number;
use crate::Error;

/// Log path used for entries that have no concrete target.
const GLOBAL_LABEL: &str = "Global";

/// What one application of a rule set produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    /// Changes relative to the snapshot, restricted to snapshot keys.
    pub data: Value,
    /// Rendered log, one entry per line.
    pub log: String,
    pub raw_logs: Vec<LogEntry>,
}

/// Per-iteration control signal of the rule state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Condition held: run handles, clamp, keep looping.
    Continue,
    /// Condition failed on the first scoped iteration: clamp, then stop.
    ShortCircuit,
    /// Condition failed: stop without clamping.
    Stop,
}

/// Drives rule sets against a state tree.
///
/// The engine owns its expression cache; the cache is cleared whenever an
/// application finishes, so repeated calls never observe each other.
///
/// ```
/// use serde_json::json;
/// use sheet_rules::{RuleEngine, RuleSetBuilder};
///
/// let rules = RuleSetBuilder::new()
///     .rule("cap", |r| r.path("stat.hp").range(0.0, 100.0))
///     .build();
/// let snapshot = json!({"stat": {"hp": 90}});
/// let data = json!({"stat": {"hp": 150}});
///
/// let outcome = RuleEngine::default().apply(&data, &snapshot, &rules);
/// assert_eq!(outcome.data, json!({"stat": {"hp": 100}}));
/// assert_eq!(outcome.raw_logs.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RuleEngine {
    config: EngineConfig,
    expressions: ExpressionEngine,
}

struct CacheGuard<'a>(&'a mut ExpressionEngine);

impl Drop for CacheGuard<'_> {
    fn drop(&mut self) {
        self.0.clear_cache();
    }
}

impl RuleEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let expressions = ExpressionEngine::new(&config);
        Self {
            config,
            expressions,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn expressions(&self) -> &ExpressionEngine {
        &self.expressions
    }

    /// Merge `data` onto `snapshot`, run every enabled rule in order and
    /// return the diff of the result against `snapshot`.
    pub fn apply(&mut self, data: &Value, snapshot: &Value, rules: &RuleSet) -> ApplyOutcome {
        self.apply_with_yield(data, snapshot, rules, |_| {})
    }

    /// Like [`apply`](Self::apply), calling `on_rule` with the rule's name
    /// after each enabled rule finishes.
    #[instrument(skip_all, fields(rules = rules.len()))]
    pub fn apply_with_yield(
        &mut self,
        data: &Value,
        snapshot: &Value,
        rules: &RuleSet,
        mut on_rule: impl FnMut(&str),
    ) -> ApplyOutcome {
        let mut guard = CacheGuard(&mut self.expressions);
        let mut working = merge_into_snapshot(data, snapshot);
        let mut globals = VariableStore::new();
        let mut log = RuleLog::new();

        for (name, rule) in rules.enabled_in_order() {
            debug!(rule = name, path = %rule.path, "running rule");
            let run = RuleRun {
                name,
                rule,
                config: &self.config,
                expressions: &mut *guard.0,
                data: &mut working,
                snapshot,
                globals: &mut globals,
                locals: VariableStore::new(),
                log: &mut log,
            };
            if let Err(err) = run.execute() {
                error!(rule = name, error = %err, "rule failed");
                log.push(LogEntry::new(
                    name,
                    &rule.path,
                    LogAction::Error,
                    false,
                    err.to_string(),
                ));
            }
            on_rule(name);
        }

        drop(guard);
        let data = diff(&working, snapshot);
        debug!(entries = log.len(), "rule set applied");
        ApplyOutcome {
            data,
            log: log.to_string(),
            raw_logs: log.into_entries(),
        }
    }
}

/// Apply `rules` with a default-configured engine.
#[must_use]
pub fn apply_rules(data: &Value, snapshot: &Value, rules: &RuleSet) -> ApplyOutcome {
    RuleEngine::default().apply(data, snapshot, rules)
}

/// Decode a JSON rule set and apply it with a default-configured engine.
///
/// # Errors
///
/// Returns [`Error::RuleSet`] when `rules_json` is not a valid rule set.
pub fn apply_rules_json(data: &Value, snapshot: &Value, rules_json: &str) -> Result<ApplyOutcome, Error> {
    let rules = RuleSet::from_json(rules_json)?;
    Ok(apply_rules(data, snapshot, &rules))
}

/// A handle with its expressions already bound to one context.
struct BoundHandle<'r> {
    key: &'r str,
    handle: &'r Handle,
    condition: Option<String>,
    op: String,
}

/// One rule's execution against the working data.
struct RuleRun<'a> {
    name: &'a str,
    rule: &'a Rule,
    config: &'a EngineConfig,
    expressions: &'a mut ExpressionEngine,
    data: &'a mut Value,
    snapshot: &'a Value,
    globals: &'a mut VariableStore,
    locals: VariableStore,
    log: &'a mut RuleLog,
}

impl RuleRun<'_> {
    fn execute(mut self) -> Result<(), RuleError> {
        self.rule.validate()?;
        let contexts = self.contexts();
        debug!(rule = self.name, contexts = contexts.len(), "resolved contexts");
        for context in &contexts {
            self.run_context(context);
        }
        Ok(())
    }

    fn contexts(&self) -> Vec<Context> {
        if !self.rule.is_global() {
            return correlate::contexts(&*self.data, &self.path_expression());
        }
        match &self.rule.condition {
            Some(condition) => correlate::contexts(&*self.data, &preprocess(condition)),
            None => vec![Context::new()],
        }
    }

    fn path_expression(&self) -> String {
        format!("$[{}]", self.rule.path)
    }

    /// The rule's path with the context's keys substituted.
    fn concrete_path(&self, context: &Context) -> Option<String> {
        if self.rule.is_global() {
            return None;
        }
        let injected = correlate::inject(&self.path_expression(), context);
        injected
            .strip_prefix("$[")
            .and_then(|rest| rest.strip_suffix(']'))
            .map(str::to_owned)
    }

    fn evaluate(&mut self, expression: &str) -> Result<Vec<EvalItem>, Error> {
        self.expressions
            .evaluate(expression, self.data, self.globals, &mut self.locals)
    }

    fn push(&mut self, path: &str, action: LogAction, success: bool, message: String) {
        self.log
            .push(LogEntry::new(self.name, path, action, success, message));
    }

    fn run_context(&mut self, context: &Context) {
        let rule = self.rule;
        let target = self.concrete_path(context);
        let label = target.clone().unwrap_or_else(|| GLOBAL_LABEL.to_owned());
        let keys = context.values().cloned().collect::<Vec<_>>().join(".");
        let condition = rule
            .condition
            .as_deref()
            .map(|c| correlate::inject(c, context));
        let handles: Vec<BoundHandle<'_>> = rule
            .sorted_handles()
            .into_iter()
            .map(|(key, handle)| BoundHandle {
                key,
                handle,
                condition: handle.condition.as_deref().map(|c| correlate::inject(c, context)),
                op: correlate::inject(&handle.op, context),
            })
            .collect();

        let total = self.config.loop_count(rule.loop_count);
        for iteration in 0..total {
            let logged = self.config.should_log(iteration, total);
            if self.config.is_skip_marker(iteration, total) {
                let message = self.skip_message(total);
                self.push(&label, LogAction::Skip, true, message);
            }

            let flow = self.check(condition.as_deref(), iteration, logged, &label);
            if flow == Flow::Stop {
                break;
            }
            if flow == Flow::Continue {
                for bound in &handles {
                    self.run_handle(bound, &label, &keys);
                }
            }
            if let Some(path) = &target {
                self.clamp(path, logged);
            }
            if flow == Flow::ShortCircuit {
                break;
            }
        }
    }

    fn skip_message(&self, total: usize) -> String {
        let window = self.config.log_window;
        format!(
            "skipping log entries for iterations {} to {}",
            window + 1,
            total - window
        )
    }

    fn check(&mut self, condition: Option<&str>, iteration: usize, logged: bool, label: &str) -> Flow {
        let Some(condition) = condition else {
            return Flow::Continue;
        };
        let met = match self.evaluate(condition) {
            Ok(items) => all_true(&items),
            Err(err) => {
                if logged {
                    self.push(
                        label,
                        LogAction::Error,
                        false,
                        format!("rule 'if' failed: {err}"),
                    );
                }
                false
            }
        };
        if met {
            Flow::Continue
        } else if self.rule.is_global() || iteration > 0 {
            Flow::Stop
        } else {
            Flow::ShortCircuit
        }
    }

    fn run_handle(&mut self, bound: &BoundHandle<'_>, label: &str, keys: &str) {
        let total = self.config.loop_count(bound.handle.loop_count);
        for i in 0..total {
            let logged = self.config.should_log(i, total);
            let step = format!("Loop {}/{total} [{}]", i + 1, bound.key);
            if self.config.is_skip_marker(i, total) {
                let message = format!("{step} {}", self.skip_message(total));
                self.push(label, LogAction::Skip, true, message);
            }

            if let Some(condition) = &bound.condition {
                match self.evaluate(condition) {
                    Ok(items) if all_true(&items) => {}
                    Ok(_) => break,
                    Err(err) => {
                        if logged {
                            self.push(
                                label,
                                LogAction::Error,
                                false,
                                format!("{step} 'if' failed: {err}"),
                            );
                        }
                        break;
                    }
                }
            }

            match self.evaluate(&bound.op) {
                Ok(items) if logged => {
                    for item in items {
                        self.record(item, &step, label, keys);
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    if logged {
                        self.push(label, LogAction::Error, false, format!("{step} failed: {err}"));
                    }
                }
            }
        }
    }

    fn record(&mut self, item: EvalItem, step: &str, label: &str, keys: &str) {
        let entry = match item.target {
            Some(Target::Data(path)) => LogEntry::new(
                self.name,
                &path,
                LogAction::Handle,
                true,
                if keys.is_empty() {
                    step.to_owned()
                } else {
                    format!("{step} (ctx: {keys})")
                },
            )
            .with_change(item.previous.unwrap_or(Value::Null), item.value),
            Some(Target::Temp(var)) => LogEntry::new(
                self.name,
                &var,
                LogAction::Handle,
                true,
                format!("{step} assigned {}", item.value),
            ),
            None => LogEntry::new(
                self.name,
                label,
                LogAction::Handle,
                true,
                format!("{step} computed {} (no assignment)", item.value),
            ),
        };
        self.log.push(entry);
    }

    /// Apply `limit` (against the snapshot) and then `range` to the value at
    /// `path`. Non-numeric values are left alone.
    fn clamp(&mut self, path: &str, logged: bool) {
        if let Some([min, max]) = self.rule.limit {
            let current = path::get_dotted(self.data, path).and_then(Value::as_f64);
            let base = path::get_dotted(self.snapshot, path).and_then(Value::as_f64);
            if let (Some(current), Some(base)) = (current, base) {
                let delta = current - base;
                if delta > max || delta < min {
                    let limited = if delta > max { max } else { min };
                    self.write(
                        path,
                        current,
                        base + limited,
                        logged,
                        LogAction::Limit,
                        format!("delta {delta} limited to [{min}, {max}]"),
                    );
                }
            }
        }

        if let Some([min, max]) = self.rule.range {
            let current = path::get_dotted(self.data, path).and_then(Value::as_f64);
            if let Some(current) = current {
                if current > max || current < min {
                    let clamped = current.min(max).max(min);
                    self.write(
                        path,
                        current,
                        clamped,
                        logged,
                        LogAction::Range,
                        format!("value clamped to [{min}, {max}]"),
                    );
                }
            }
        }
    }

    fn write(
        &mut self,
        path: &str,
        from: f64,
        to: f64,
        logged: bool,
        action: LogAction,
        message: String,
    ) {
        let (Some(from), Some(to)) = (number(from), number(to)) else {
            return;
        };
        path::set_dotted(self.data, path, to.clone());
        if logged {
            self.log.push(
                LogEntry::new(self.name, path, action, true, message).with_change(from, to),
            );
        }
    }
}

fn all_true(items: &[EvalItem]) -> bool {
    items.iter().all(|item| item.value == Value::Bool(true))
}
