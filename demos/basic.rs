use serde_json::json;
use sheet_rules::{RuleEngine, RuleSetBuilder};

fn main() {
    // Define rules
    let rules = RuleSetBuilder::new()
        .rule("regen", |r| {
            r.path("party.*.hp")
                .when("$[party.*.hp] ?[<] &[{num}50]")
                .handle("tick", |h| {
                    h.op("$[party.*.hp] #[=] $[party.*.hp] #[+] $[party.*.regen]")
                })
        })
        .rule("hp_cap", |r| r.order(1.0).path("party.*.hp").range(0.0, 100.0))
        .build();

    println!("{rules}");

    let snapshot = json!({
        "party": {
            "ann": {"hp": 40, "regen": 15},
            "bob": {"hp": 120, "regen": 5}
        }
    });

    let outcome = RuleEngine::default().apply(&snapshot, &snapshot, &rules);
    println!("changes: {}", outcome.data);
    println!("{}", outcome.log);
}
