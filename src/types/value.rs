//! Coercion helpers over [`serde_json::Value`], the state tree's value type.
//!
//! Numbers are handled as `f64` throughout evaluation and converted back to
//! the narrowest JSON representation when written, so `2.0` is stored as `2`.

use std::cmp::Ordering;

use serde_json::Value;

use super::expr::Literal;

/// Runtime type name used in error messages and type-match checks.
/// Arrays and objects are distinct, unlike JavaScript's `typeof`.
#[must_use]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build a JSON number from an `f64`. Returns `None` for NaN and infinities.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn number(n: f64) -> Option<Value> {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        // -0.0 collapses to 0
        return Some(Value::from(n as i64));
    }
    serde_json::Number::from_f64(n).map(Value::Number)
}

pub(crate) fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Number(n) => number(*n).unwrap_or(Value::Null),
        Literal::String(s) => Value::String(s.clone()),
    }
}

/// Loose equality: numbers compare numerically regardless of their JSON
/// representation, containers compare structurally.
#[must_use]
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| loose_eq(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| loose_eq(v, other)))
        }
        _ => a == b,
    }
}

/// JavaScript-style truthiness, used by `&&` and `||`.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Ordering between two primitives of the same type.
/// Returns `None` for mixed types and for arrays or objects.
#[must_use]
pub fn compare_primitives(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn number_prefers_integer_representation() {
        assert_eq!(number(2.0), Some(json!(2)));
        assert_eq!(number(-0.0), Some(json!(0)));
        assert_eq!(number(2.5), Some(json!(2.5)));
        assert_eq!(number(f64::NAN), None);
        assert_eq!(number(f64::INFINITY), None);
    }

    #[test]
    fn loose_eq_ignores_number_representation() {
        assert!(loose_eq(&json!(2), &json!(2.0)));
        assert!(loose_eq(&json!([1, {"a": 2}]), &json!([1.0, {"a": 2.0}])));
        assert!(!loose_eq(&json!(1), &json!("1")));
        assert!(loose_eq(&Value::Null, &Value::Null));
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!(-1)));
    }

    #[test]
    fn compare_requires_same_primitive_type() {
        assert_eq!(compare_primitives(&json!(1), &json!(2)), Some(Ordering::Less));
        assert_eq!(
            compare_primitives(&json!("b"), &json!("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(compare_primitives(&json!(1), &json!("1")), None);
        assert_eq!(compare_primitives(&json!({}), &json!({})), None);
    }

    #[test]
    fn type_names() {
        assert_eq!(type_name(&json!([])), "array");
        assert_eq!(type_name(&json!({})), "object");
        assert_eq!(type_name(&json!(null)), "null");
    }
}
