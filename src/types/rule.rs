use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{RuleError, RuleSetError};

/// Rule path meaning "no fixed target": contexts come from the rule's `if`.
pub const GLOBAL_PATH: &str = "*";

fn default_enable() -> bool {
    true
}

/// A named sub-operation of a [`Rule`], run after the rule's condition holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handle {
    #[serde(default)]
    pub order: f64,
    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_count: Option<f64>,
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub op: String,
}

/// One entry of a rule set.
///
/// `path` is either [`GLOBAL_PATH`] or a dotted path that may contain `*`
/// wildcard segments. `range` clamps the value at `path`; `limit` clamps
/// its change relative to the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub path: String,
    #[serde(default = "default_enable")]
    pub enable: bool,
    #[serde(default)]
    pub order: f64,
    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<[f64; 2]>,
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(
        default,
        rename = "handle",
        with = "keyed",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub handles: Vec<(String, Handle)>,
    /// Why the rule's JSON failed to decode, if it did.
    #[serde(skip)]
    decode_error: Option<String>,
}

impl Rule {
    /// A rule with no fixed target path.
    #[must_use]
    pub fn global() -> Self {
        Self::scoped(GLOBAL_PATH)
    }

    /// A rule targeting `path`.
    #[must_use]
    pub fn scoped(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            enable: true,
            order: 0.0,
            loop_count: None,
            range: None,
            limit: None,
            condition: None,
            handles: Vec::new(),
            decode_error: None,
        }
    }

    /// Decode one rule object. A rule that does not match the schema is
    /// kept as a placeholder that fails [`validate`](Self::validate), so it
    /// costs only its own run. `path`, `enable` and `order` are still read
    /// from the raw object when they are well-typed.
    #[must_use]
    pub fn from_value(raw: &Value) -> Self {
        match Self::deserialize(raw) {
            Ok(rule) => rule,
            Err(err) => {
                let path = raw.get("path").and_then(Value::as_str).unwrap_or("");
                let mut rule = Self::scoped(path);
                rule.enable = raw.get("enable").and_then(Value::as_bool).unwrap_or(true);
                rule.order = raw.get("order").and_then(Value::as_f64).unwrap_or(0.0);
                rule.decode_error = Some(err.to_string());
                rule
            }
        }
    }

    #[must_use]
    pub fn is_global(&self) -> bool {
        self.path == GLOBAL_PATH
    }

    /// Check that the rule can run: a non-empty path and finite,
    /// non-inverted `range`/`limit` bounds.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleError`] found, starting with a decode
    /// failure recorded by [`Rule::from_value`].
    pub fn validate(&self) -> Result<(), RuleError> {
        if let Some(reason) = &self.decode_error {
            return Err(RuleError::Malformed {
                reason: reason.clone(),
            });
        }
        if self.path.is_empty() {
            return Err(RuleError::EmptyPath);
        }
        for (field, bounds) in [("limit", self.limit), ("range", self.range)] {
            let Some([min, max]) = bounds else {
                continue;
            };
            if !(min.is_finite() && max.is_finite()) {
                return Err(RuleError::NonFiniteBounds { field, min, max });
            }
            if min > max {
                return Err(RuleError::InvertedBounds { field, min, max });
            }
        }
        Ok(())
    }

    /// Handles sorted by `order`; equal orders keep their declaration order.
    #[must_use]
    pub fn sorted_handles(&self) -> Vec<(&str, &Handle)> {
        let mut handles: Vec<(&str, &Handle)> =
            self.handles.iter().map(|(k, h)| (k.as_str(), h)).collect();
        handles.sort_by(|a, b| a.1.order.total_cmp(&b.1.order));
        handles
    }
}

/// An ordered collection of named rules.
///
/// Rules run in ascending `order`; ties keep declaration order.
///
/// # Example
///
/// ```
/// use sheet_rules::RuleSetBuilder;
///
/// let rules = RuleSetBuilder::new()
///     .rule("hp_cap", |r| r.path("stat.hp").range(0.0, 100.0))
///     .rule("regen", |r| {
///         r.order(-1.0)
///             .handle("tick", |h| h.op("$[stat.hp] #[=] $[stat.hp] #[+] &[{num}5]"))
///     })
///     .build();
/// assert_eq!(rules.len(), 2);
/// assert_eq!(rules.execution_order(), vec!["regen", "hp_cap"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    #[serde(with = "keyed")]
    rules: Vec<(String, Rule)>,
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON rule set. Accepts the bare `{ name: rule }` map or an
    /// export envelope `{ "rules": { name: rule } }`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError`] if the text is not valid JSON. Rules that do
    /// not match the rule schema are kept and fail on their own when run.
    pub fn from_json(input: &str) -> Result<Self, RuleSetError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Build a rule set from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError`] if the value is not an object of rules.
    /// Individual rules are decoded with [`Rule::from_value`].
    pub fn from_value(value: Value) -> Result<Self, RuleSetError> {
        let Value::Object(mut map) = value else {
            return Err(RuleSetError::NotAnObject);
        };
        let is_envelope = matches!(
            map.get("rules"),
            Some(Value::Object(inner)) if !inner.contains_key("path")
        );
        if is_envelope {
            if let Some(inner) = map.remove("rules") {
                return Self::from_value(inner);
            }
        }
        let rules = map
            .into_iter()
            .map(|(name, raw)| (name, Rule::from_value(&raw)))
            .collect();
        Ok(Self { rules })
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError`] if serialization fails.
    pub fn to_json(&self) -> Result<String, RuleSetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add or replace a rule.
    pub fn insert(&mut self, name: &str, rule: Rule) {
        if let Some(slot) = self.rules.iter_mut().find(|(n, _)| n == name) {
            slot.1 = rule;
        } else {
            self.rules.push((name.to_owned(), rule));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(n, r)| (n.as_str(), r))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Enabled rules in the order they execute.
    #[must_use]
    pub fn enabled_in_order(&self) -> Vec<(&str, &Rule)> {
        let mut rules: Vec<(&str, &Rule)> = self.iter().filter(|(_, r)| r.enable).collect();
        rules.sort_by(|a, b| a.1.order.total_cmp(&b.1.order));
        rules
    }

    /// Names of the enabled rules in execution order.
    #[must_use]
    pub fn execution_order(&self) -> Vec<&str> {
        self.enabled_in_order().into_iter().map(|(n, _)| n).collect()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enabled = self.rules.iter().filter(|(_, r)| r.enable).count();
        let handles: usize = self.rules.iter().map(|(_, r)| r.handles.len()).sum();
        write!(
            f,
            "RuleSet({} rules, {enabled} enabled, {handles} handles)",
            self.rules.len()
        )
    }
}

/// Builder for constructing a [`RuleSet`] in code.
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: RuleSet,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug)]
pub struct RuleBuilder {
    rule: Rule,
}

/// Intermediate builder passed to the handle definition closure.
#[derive(Debug)]
pub struct HandleBuilder {
    handle: Handle,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule. Rules default to global mode (`path` = `*`), enabled,
    /// order 0.
    #[must_use]
    pub fn rule(mut self, name: &str, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder {
            rule: Rule::global(),
        });
        self.rules.insert(name, builder.rule);
        self
    }

    #[must_use]
    pub fn build(self) -> RuleSet {
        self.rules
    }
}

impl RuleBuilder {
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.rule.path = path.to_owned();
        self
    }

    #[must_use]
    pub fn enable(mut self, enable: bool) -> Self {
        self.rule.enable = enable;
        self
    }

    #[must_use]
    pub fn order(mut self, order: f64) -> Self {
        self.rule.order = order;
        self
    }

    #[must_use]
    pub fn repeat(mut self, count: f64) -> Self {
        self.rule.loop_count = Some(count);
        self
    }

    #[must_use]
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.rule.range = Some([min, max]);
        self
    }

    #[must_use]
    pub fn limit(mut self, min: f64, max: f64) -> Self {
        self.rule.limit = Some([min, max]);
        self
    }

    /// Set the rule's `if` expression.
    #[must_use]
    pub fn when(mut self, condition: &str) -> Self {
        self.rule.condition = Some(condition.to_owned());
        self
    }

    /// Add a handle. The closure must call `.op(...)`; a handle without one
    /// evaluates the empty expression and logs a syntax error.
    #[must_use]
    pub fn handle(mut self, key: &str, f: impl FnOnce(HandleBuilder) -> HandleBuilder) -> Self {
        let order = self.rule.handles.len();
        #[allow(clippy::cast_precision_loss)]
        let builder = f(HandleBuilder {
            handle: Handle {
                order: order as f64,
                loop_count: None,
                condition: None,
                op: String::new(),
            },
        });
        self.rule.handles.push((key.to_owned(), builder.handle));
        self
    }
}

impl HandleBuilder {
    #[must_use]
    pub fn order(mut self, order: f64) -> Self {
        self.handle.order = order;
        self
    }

    #[must_use]
    pub fn repeat(mut self, count: f64) -> Self {
        self.handle.loop_count = Some(count);
        self
    }

    #[must_use]
    pub fn when(mut self, condition: &str) -> Self {
        self.handle.condition = Some(condition.to_owned());
        self
    }

    #[must_use]
    pub fn op(mut self, op: &str) -> Self {
        self.handle.op = op.to_owned();
        self
    }
}

/// (De)serializes `Vec<(String, T)>` as a JSON object, keeping key order.
mod keyed {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, T>(items: &Vec<(String, T)>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_map(items.iter().map(|(k, v)| (k, v)))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        struct KeyedVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for KeyedVisitor<T> {
            type Value = Vec<(String, T)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object keyed by name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, T>()? {
                    out.push(entry);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(KeyedVisitor(PhantomData))
    }
}
