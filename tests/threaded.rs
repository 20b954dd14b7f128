use std::sync::Arc;
use std::thread;

use serde_json::{json, Value};
use sheet_rules::{RuleEngine, RuleSetBuilder};

#[test]
fn engines_per_thread_share_one_rule_set() {
    let rules = Arc::new(
        RuleSetBuilder::new()
            .rule("regen", |r| {
                r.path("party.*.hp")
                    .handle("tick", |h| h.op("$[party.*.hp] #[=] $[party.*.hp] #[+] &[{num}20]"))
            })
            .rule("cap", |r| r.order(1.0).path("party.*.hp").range(0.0, 100.0))
            .build(),
    );
    let snapshot = Arc::new(json!({"party": {"ann": {"hp": 50}, "bob": {"hp": 95}}}));

    let inputs = vec![
        json!({"party": {"ann": {"hp": 10}}}),
        json!({"party": {"bob": {"hp": 0}}}),
        json!({"party": {"ann": {"hp": "broken"}}}),
        json!({}),
    ];

    let handles: Vec<_> = inputs
        .into_iter()
        .map(|data| {
            let rules = Arc::clone(&rules);
            let snapshot = Arc::clone(&snapshot);
            thread::spawn(move || RuleEngine::default().apply(&data, &snapshot, &rules).data)
        })
        .collect();

    let results: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results[0], json!({"party": {"ann": {"hp": 30}, "bob": {"hp": 100}}}));
    assert_eq!(results[1], json!({"party": {"ann": {"hp": 70}, "bob": {"hp": 20}}}));
    // mistyped input is ignored by the merge
    assert_eq!(results[2], json!({"party": {"ann": {"hp": 70}, "bob": {"hp": 100}}}));
    assert_eq!(results[3], results[2]);
}
