use proptest::prelude::*;
use serde_json::{Map, Value};

// --- Fixed state schema ---
// <member>.<stat> : integer (-50..=150)
// members drawn from MEMBERS, stats drawn from STATS, each member carrying
// a random subset of the stats.

pub const MEMBERS: &[&str] = &["ann", "bob", "cat", "dan"];
pub const STATS: &[&str] = &["hp", "mp", "str", "dex"];
const OPERATORS: &[&str] = &["#[+]", "#[-]", "#[*]", "?[<]", "?[==]"];

/// Generate a two-level state tree `{member: {stat: n}}`.
pub fn arb_state() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(
        prop::sample::select(MEMBERS),
        prop::collection::btree_map(prop::sample::select(STATS), -50_i64..=150, 0..=STATS.len()),
        1..=MEMBERS.len(),
    )
    .prop_map(|members| {
        let root: Map<String, Value> = members
            .into_iter()
            .map(|(member, stats)| {
                let stats: Map<String, Value> = stats
                    .into_iter()
                    .map(|(stat, n)| (stat.to_owned(), Value::from(n)))
                    .collect();
                (member.to_owned(), Value::Object(stats))
            })
            .collect();
        Value::Object(root)
    })
}

/// A dotted path over the schema, with each segment possibly a wildcard.
pub fn arb_path() -> impl Strategy<Value = String> {
    let member = prop_oneof![Just("*".to_owned()), prop::sample::select(MEMBERS).prop_map(str::to_owned)];
    let stat = prop_oneof![Just("*".to_owned()), prop::sample::select(STATS).prop_map(str::to_owned)];
    (member, stat).prop_map(|(m, s)| format!("{m}.{s}"))
}

/// A dotted path with no wildcards.
pub fn arb_concrete_path() -> impl Strategy<Value = String> {
    (prop::sample::select(MEMBERS), prop::sample::select(STATS)).prop_map(|(m, s)| format!("{m}.{s}"))
}

/// A read-only arithmetic or comparison expression over 1..=3 path
/// references.
pub fn arb_expression(path: impl Strategy<Value = String>) -> impl Strategy<Value = String> {
    let op = prop::sample::select(OPERATORS);
    prop::collection::vec((path, op), 1..=3).prop_map(|parts| {
        let mut text = String::new();
        for (i, (path, op)) in parts.iter().enumerate() {
            if i > 0 {
                text.push_str(op);
            }
            text.push_str(&format!("$[{path}]"));
        }
        text
    })
}

/// Ordered `[min, max]` bounds.
pub fn arb_bounds() -> impl Strategy<Value = [f64; 2]> {
    (-100_i32..=100, 0_i32..=100).prop_map(|(min, width)| [f64::from(min), f64::from(min + width)])
}

/// Like [`arb_path`], with at least one wildcard segment.
pub fn arb_wildcard_path() -> impl Strategy<Value = String> {
    arb_path().prop_filter("needs a wildcard", |p| p.contains('*'))
}
