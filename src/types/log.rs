use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What kind of step produced a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogAction {
    Handle,
    Limit,
    Range,
    Skip,
    Error,
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogAction::Handle => "handle",
            LogAction::Limit => "limit",
            LogAction::Range => "range",
            LogAction::Skip => "skip",
            LogAction::Error => "error",
        };
        f.write_str(s)
    }
}

/// Before/after values of a write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub from: Value,
    pub to: Value,
}

/// One structured record of what the rule engine did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub rule_name: String,
    pub path: String,
    pub action: LogAction,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Change>,
    pub success: bool,
}

impl LogEntry {
    pub(crate) fn new(
        rule_name: &str,
        path: &str,
        action: LogAction,
        success: bool,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.to_owned(),
            path: path.to_owned(),
            action,
            message: message.into(),
            changes: None,
            success,
        }
    }

    #[must_use]
    pub(crate) fn with_change(mut self, from: Value, to: Value) -> Self {
        self.changes = Some(Change { from, to });
        self
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "✅" } else { "❌" };
        write!(
            f,
            "[{}] {status} [{}] {}: {}",
            self.rule_name, self.action, self.path, self.message
        )?;
        if let Some(change) = &self.changes {
            write!(f, " ({} -> {})", change.from, change.to)?;
        }
        Ok(())
    }
}

/// Append-only log collected during one rule-set application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleLog {
    entries: Vec<LogEntry>,
}

impl RuleLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for RuleLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "no operations executed");
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn entry_display_with_change() {
        let entry = LogEntry::new("cap", "stat.hp", LogAction::Range, true, "value clamped")
            .with_change(json!(150), json!(100));
        assert_eq!(
            entry.to_string(),
            "[cap] ✅ [range] stat.hp: value clamped (150 -> 100)"
        );
    }

    #[test]
    fn empty_log_display() {
        assert_eq!(RuleLog::new().to_string(), "no operations executed");
    }

    #[test]
    fn log_lines_joined() {
        let mut log = RuleLog::new();
        log.push(LogEntry::new("a", "x", LogAction::Handle, true, "one"));
        log.push(LogEntry::new("b", "y", LogAction::Error, false, "two"));
        assert_eq!(
            log.to_string(),
            "[a] ✅ [handle] x: one\n[b] ❌ [error] y: two"
        );
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn entry_serializes_camel_case() {
        let entry = LogEntry::new("r", "p", LogAction::Limit, true, "m");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            json!({"ruleName": "r", "path": "p", "action": "limit", "message": "m", "success": true})
        );
    }
}
