use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::parse::{parse, SyntaxError};
use crate::types::expr::Expr;

/// Default number of parsed expressions kept by an [`AstCache`].
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Bounded least-recently-used map from concrete expression text to its
/// parsed tree.
///
/// Owned by one [`RuleEngine`](crate::RuleEngine); nothing is shared between
/// engines. A capacity of zero disables caching.
#[derive(Debug)]
pub struct AstCache {
    capacity: usize,
    entries: HashMap<String, (Arc<Expr>, u64)>,
    recency: BTreeMap<u64, String>,
    tick: u64,
    hits: u64,
    misses: u64,
}

impl Default for AstCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl AstCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            tick: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached tree for `text`, parsing and caching it on a miss.
    /// Parse failures are not cached.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError`] when `text` does not parse.
    pub fn get_or_parse(&mut self, text: &str) -> Result<Arc<Expr>, SyntaxError> {
        if let Some(expr) = self.get(text) {
            return Ok(expr);
        }
        let expr = Arc::new(parse(text)?);
        self.insert(text, Arc::clone(&expr));
        Ok(expr)
    }

    /// Look up `text`, marking it most recently used. Counts a hit or miss.
    pub fn get(&mut self, text: &str) -> Option<Arc<Expr>> {
        self.tick += 1;
        let tick = self.tick;
        let Some((expr, stamp)) = self.entries.get_mut(text) else {
            self.misses += 1;
            return None;
        };
        self.hits += 1;
        let previous = std::mem::replace(stamp, tick);
        let expr = Arc::clone(expr);
        if let Some(key) = self.recency.remove(&previous) {
            self.recency.insert(tick, key);
        }
        Some(expr)
    }

    pub fn insert(&mut self, text: &str, expr: Arc<Expr>) {
        if self.capacity == 0 {
            return;
        }
        self.tick += 1;
        if let Some((_, old)) = self.entries.insert(text.to_owned(), (expr, self.tick)) {
            self.recency.remove(&old);
        }
        self.recency.insert(self.tick, text.to_owned());
        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            tracing::trace!(expression = %oldest, "evicting cached expression");
            self.entries.remove(&oldest);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }
}
