use serde::{Deserialize, Serialize};

/// How the evaluator treats a `$[path]` that does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPath {
    /// Fail the expression with an undefined-path error.
    #[default]
    Error,
    /// Read the path as `null`.
    Null,
}

/// Tunables for a [`RuleEngine`](crate::RuleEngine).
///
/// Every field has a default, so a partial JSON object deserializes cleanly:
///
/// ```
/// let config: sheet_rules::EngineConfig =
///     serde_json::from_str(r#"{ "max_loop": 50 }"#).unwrap();
/// assert_eq!(config.max_loop, 50);
/// assert_eq!(config.log_window, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound for rule and handle loop counts.
    pub max_loop: usize,
    /// Loops longer than twice this only log their first and last
    /// `log_window` iterations.
    pub log_window: usize,
    /// Maximum number of parsed expressions kept in the AST cache.
    pub cache_capacity: usize,
    pub missing_path: MissingPath,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_loop: 10_000,
            log_window: 10,
            cache_capacity: 10_000,
            missing_path: MissingPath::Error,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_loop(mut self, max_loop: usize) -> Self {
        self.max_loop = max_loop.max(1);
        self
    }

    #[must_use]
    pub fn with_log_window(mut self, log_window: usize) -> Self {
        self.log_window = log_window;
        self
    }

    #[must_use]
    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    #[must_use]
    pub fn with_missing_path(mut self, missing_path: MissingPath) -> Self {
        self.missing_path = missing_path;
        self
    }

    /// Clamp a configured loop count into `[1, max_loop]`.
    /// Absent, NaN and non-positive counts run once; fractions round up.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn loop_count(&self, requested: Option<f64>) -> usize {
        let max = self.max_loop.max(1);
        match requested {
            Some(n) if n.is_finite() && n > 1.0 => (n.ceil().min(max as f64) as usize).max(1),
            Some(n) if n.is_infinite() && n > 0.0 => max,
            _ => 1,
        }
    }

    /// Whether iteration `index` of a loop running `total` times is logged.
    #[must_use]
    pub fn should_log(&self, index: usize, total: usize) -> bool {
        let w = self.log_window;
        total <= w.saturating_mul(2) || index < w || index >= total - w
    }

    /// Whether iteration `index` is where the elided-range `skip` entry goes.
    #[must_use]
    pub fn is_skip_marker(&self, index: usize, total: usize) -> bool {
        total > self.log_window.saturating_mul(2) && index == self.log_window
    }
}
