use serde_json::json;
use sheet_rules::{EngineConfig, RuleEngine, RuleSet};

const RULES: &str = r#"{
    "rules": {
        "turn_counter": {
            "path": "*",
            "order": 0,
            "handle": {
                "count": { "order": 0, "op": "<<op> @[{g}turns] #[=] $[world.turn] #[+] &[{num}1] >" },
                "store": { "order": 1, "op": "$[world.turn] #[=] @[{g}turns]" }
            }
        },
        "poison": {
            "path": "party.*.hp",
            "order": 1,
            "loop": 3,
            "if": "<<if> $[party.*.poisoned] ?[==] &[{bool}true] >",
            "limit": [-10, 0],
            "handle": {
                "tick": { "order": 0, "op": "$[party.*.hp] #[=] $[party.*.hp] #[-] &[{num}4]" }
            }
        },
        "broken": {
            "path": "*",
            "order": 2,
            "handle": { "oops": { "order": 0, "op": "$[world.turn" } }
        }
    }
}"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let rules = RuleSet::from_json(RULES).expect("failed to parse rules");
    let snapshot = json!({
        "world": {"turn": 7},
        "party": {
            "ann": {"hp": 30, "poisoned": true},
            "bob": {"hp": 30, "poisoned": false}
        }
    });

    let mut engine = RuleEngine::new(EngineConfig::new().with_log_window(5));
    let outcome = engine.apply_with_yield(&snapshot, &snapshot, &rules, |name| {
        println!("finished rule {name}");
    });

    println!("{}", serde_json::to_string_pretty(&outcome).expect("serializable outcome"));
}
