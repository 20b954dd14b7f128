//! Wildcard correlation.
//!
//! A path segment `*` stands for "any key at this level". Wildcards are
//! numbered per path from left to right, and the numbering is shared by every
//! path in an expression: the first `*` of each path carries ordinal 1, the
//! second ordinal 2, and so on. All segments carrying the same ordinal bind to
//! the same concrete key within one [`Context`].
//!
//! ```
//! use serde_json::json;
//!
//! let data = json!({"party": {"ann": {"hp": 3}, "bob": {"hp": 5}}});
//! let exprs = sheet_rules::correlate::expand(&data, "$[party.*.hp]#[+]&[1]");
//! assert_eq!(exprs, vec!["$[party.ann.hp]#[+]&[1]", "$[party.bob.hp]#[+]&[1]"]);
//! ```

use std::collections::BTreeMap;
use std::ops::Range;

use serde_json::Value;

use crate::path;

/// Wildcard ordinal → concrete key.
pub type Context = BTreeMap<usize, String>;

const WILDCARD: &str = "*";

/// A `$[...]` reference found in an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    /// The reference as written, including `$[` and `]`.
    pub text: String,
    pub segments: Vec<String>,
    /// Segment index → wildcard ordinal.
    pub ordinals: BTreeMap<usize, usize>,
}

impl PathInfo {
    fn new(text: &str, body: &str) -> Self {
        let segments: Vec<String> = path::segments(body).into_iter().map(str::to_owned).collect();
        let ordinals = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| *s == WILDCARD)
            .enumerate()
            .map(|(k, (index, _))| (index, k + 1))
            .collect();
        Self {
            text: text.to_owned(),
            segments,
            ordinals,
        }
    }

    /// Number of wildcard segments in this path.
    #[must_use]
    pub fn wildcard_count(&self) -> usize {
        self.ordinals.len()
    }

    fn index_of(&self, ordinal: usize) -> Option<usize> {
        self.ordinals
            .iter()
            .find_map(|(&index, &o)| (o == ordinal).then_some(index))
    }

    /// Segments before the wildcard carrying `ordinal`, with earlier
    /// wildcards replaced by their bound keys.
    fn prefix(&self, ordinal: usize, context: &Context) -> Option<Vec<String>> {
        let end = self.index_of(ordinal)?;
        self.segments[..end]
            .iter()
            .enumerate()
            .map(|(i, segment)| match self.ordinals.get(&i) {
                Some(o) => context.get(o).cloned(),
                None => Some(segment.clone()),
            })
            .collect()
    }

    /// Rebuild the reference with every wildcard the context binds replaced.
    #[must_use]
    pub fn reconstruct(&self, context: &Context) -> String {
        let resolved: Vec<&str> = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                self.ordinals
                    .get(&i)
                    .and_then(|o| context.get(o))
                    .map_or(segment.as_str(), String::as_str)
            })
            .collect();
        format!("$[{}]", resolved.join("."))
    }
}

/// Byte ranges and bodies of every `$[...]` reference in `expression`.
fn references(expression: &str) -> Vec<(Range<usize>, &str)> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(open) = expression[from..].find("$[").map(|i| i + from) {
        let body_start = open + 2;
        let Some(close) = expression[body_start..].find(']').map(|i| i + body_start) else {
            break;
        };
        found.push((open..close + 1, &expression[body_start..close]));
        from = close + 1;
    }
    found
}

/// Replace every reference in `expression` using `rewrite`.
fn rewrite_references(expression: &str, mut rewrite: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(expression.len());
    let mut last = 0;
    for (range, body) in references(expression) {
        out.push_str(&expression[last..range.start]);
        out.push_str(&rewrite(body));
        last = range.end;
    }
    out.push_str(&expression[last..]);
    out
}

/// Every `$[...]` reference in `expression`, in order of appearance.
#[must_use]
pub fn path_infos(expression: &str) -> Vec<PathInfo> {
    references(expression)
        .into_iter()
        .map(|(range, body)| PathInfo::new(&expression[range], body))
        .collect()
}

struct Resolver<'a> {
    data: &'a Value,
    paths: &'a [PathInfo],
    max_ordinal: usize,
}

impl Resolver<'_> {
    fn resolve(&self, ordinal: usize, context: &Context) -> Vec<Context> {
        if ordinal > self.max_ordinal {
            return vec![context.clone()];
        }
        let group: Vec<&PathInfo> = self
            .paths
            .iter()
            .filter(|p| p.wildcard_count() >= ordinal)
            .collect();
        let Some(leader) = group.first() else {
            return self.resolve(ordinal + 1, context);
        };
        let Some(parent) = leader
            .prefix(ordinal, context)
            .and_then(|prefix| path::get(self.data, &prefix))
        else {
            return Vec::new();
        };

        path::keys(parent)
            .into_iter()
            .filter(|key| group.iter().all(|member| self.connects(member, ordinal, context, key)))
            .flat_map(|key| {
                let mut next = context.clone();
                next.insert(ordinal, key);
                self.resolve(ordinal + 1, &next)
            })
            .collect()
    }

    /// Whether binding `key` to `ordinal` keeps `member` connected: the key
    /// exists under the member's own parent, and the static segments up to
    /// its next wildcard (or its end) resolve.
    fn connects(&self, member: &PathInfo, ordinal: usize, context: &Context, key: &str) -> bool {
        let (Some(mut probe), Some(index)) =
            (member.prefix(ordinal, context), member.index_of(ordinal))
        else {
            return false;
        };
        let has_key = path::get(self.data, &probe).is_some_and(|parent| path::has_key(parent, key));
        if !has_key {
            return false;
        }
        let next_wildcard = member
            .ordinals
            .keys()
            .copied()
            .find(|&i| i > index)
            .unwrap_or(member.segments.len());
        probe.push(key.to_owned());
        probe.extend(member.segments[index + 1..next_wildcard].iter().cloned());
        path::get(self.data, &probe).is_some()
    }
}

/// All contexts under which every wildcarded path in `expression` resolves
/// against `data`. An expression without wildcards yields a single empty
/// context; an expression whose wildcards match nothing yields none.
#[must_use]
pub fn contexts(data: &Value, expression: &str) -> Vec<Context> {
    let paths = path_infos(expression);
    let max_ordinal = paths.iter().map(PathInfo::wildcard_count).max().unwrap_or(0);
    if max_ordinal == 0 {
        return vec![Context::new()];
    }
    let resolver = Resolver {
        data,
        paths: &paths,
        max_ordinal,
    };
    resolver.resolve(1, &Context::new())
}

/// One concrete expression per context of `expression`.
#[must_use]
pub fn expand(data: &Value, expression: &str) -> Vec<String> {
    let paths = path_infos(expression);
    contexts(data, expression)
        .iter()
        .map(|context| {
            let mut rebuilt = paths.iter().map(|p| p.reconstruct(context));
            rewrite_references(expression, |_| rebuilt.next().unwrap_or_default())
        })
        .collect()
}

/// Substitute a known context into any expression. Within each `$[...]` the
/// i-th `*` takes the key bound to ordinal i; wildcards beyond the context
/// stay in place for later correlation.
#[must_use]
pub fn inject(expression: &str, context: &Context) -> String {
    if context.is_empty() {
        return expression.to_owned();
    }
    rewrite_references(expression, |body| {
        PathInfo::new("", body).reconstruct(context)
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ctx(pairs: &[(usize, &str)]) -> Context {
        pairs.iter().map(|&(o, k)| (o, k.to_owned())).collect()
    }

    #[test]
    fn path_infos_number_wildcards_per_path() {
        let infos = path_infos("$[a.*.b.*]#[+]$[c.*]");
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].text, "$[a.*.b.*]");
        assert_eq!(infos[0].ordinals, BTreeMap::from([(1, 1), (3, 2)]));
        assert_eq!(infos[1].ordinals, BTreeMap::from([(1, 1)]));
    }

    #[test]
    fn no_wildcards_single_empty_context() {
        let data = json!({"a": 1});
        assert_eq!(contexts(&data, "$[a]#[+]&[1]"), vec![Context::new()]);
        assert_eq!(contexts(&data, "&[1]"), vec![Context::new()]);
    }

    #[test]
    fn single_wildcard_enumerates_keys_in_order() {
        let data = json!({"z": {"x": 1}, "a": {"x": 1}});
        assert_eq!(
            contexts(&data, "$[*.x]"),
            vec![ctx(&[(1, "z")]), ctx(&[(1, "a")])]
        );
    }

    #[test]
    fn static_continuation_filters_keys() {
        let data = json!({"chars": {"ann": {"hp": 1}, "bob": {"mp": 2}}});
        assert_eq!(
            contexts(&data, "$[chars.*.hp]"),
            vec![ctx(&[(1, "ann")])]
        );
    }

    #[test]
    fn shared_ordinal_across_paths_must_exist_in_both() {
        let data = json!({
            "stats": {"ann": {"hp": 1}, "bob": {"hp": 2}, "cat": {"hp": 3}},
            "bonus": {"ann": 5, "cat": 1}
        });
        assert_eq!(
            contexts(&data, "$[stats.*.hp]#[+]$[bonus.*]"),
            vec![ctx(&[(1, "ann")]), ctx(&[(1, "cat")])]
        );
    }

    #[test]
    fn nested_wildcards() {
        let data = json!({
            "g": {
                "a": {"items": {"sword": {"dmg": 1}, "shield": {"def": 2}}},
                "b": {"items": {"bow": {"dmg": 3}}}
            }
        });
        assert_eq!(
            contexts(&data, "$[g.*.items.*.dmg]"),
            vec![
                ctx(&[(1, "a"), (2, "sword")]),
                ctx(&[(1, "b"), (2, "bow")])
            ]
        );
    }

    #[test]
    fn arrays_bind_indices() {
        let data = json!({"list": [{"v": 1}, {"w": 2}, {"v": 3}]});
        assert_eq!(
            contexts(&data, "$[list.*.v]"),
            vec![ctx(&[(1, "0")]), ctx(&[(1, "2")])]
        );
    }

    #[test]
    fn unresolvable_wildcard_yields_nothing() {
        let data = json!({"a": 1});
        assert!(contexts(&data, "$[missing.*.x]").is_empty());
        assert!(contexts(&data, "$[a.*]").is_empty());
    }

    #[test]
    fn expand_substitutes_each_reference() {
        let data = json!({"a": {"x": 1}, "b": {"x": 1}});
        assert_eq!(
            expand(&data, "$[*.x]#[=]$[*.x]#[+]&[{num}1]"),
            vec![
                "$[a.x]#[=]$[a.x]#[+]&[{num}1]",
                "$[b.x]#[=]$[b.x]#[+]&[{num}1]"
            ]
        );
    }

    #[test]
    fn expand_without_wildcards_is_identity() {
        let data = json!({});
        assert_eq!(expand(&data, "$[a]#[+]&[1]"), vec!["$[a]#[+]&[1]"]);
    }

    #[test]
    fn inject_partial_context_leaves_extra_wildcards() {
        let context = ctx(&[(1, "ann")]);
        assert_eq!(
            inject("$[chars.*.items.*]?[>]$[limits.*]", &context),
            "$[chars.ann.items.*]?[>]$[limits.ann]"
        );
        assert_eq!(inject("$[a.*]", &Context::new()), "$[a.*]");
    }

    #[test]
    fn reconstruct_leaves_unbound_wildcards() {
        let info = &path_infos("$[a.*.b.*]")[0];
        assert_eq!(info.reconstruct(&ctx(&[(1, "k")])), "$[a.k.b.*]");
    }
}
