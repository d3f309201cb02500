//! # Rules
//!
//! Path rules extracted from ACL policies, and rule sets that merge the rules
//! of several policies into one answerable view.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::capabilities::Capability;

/// A single `path "<pattern>" { capabilities = [...] }` rule.
///
/// Capabilities are kept as the raw tokens written in the policy, in order and
/// without duplicates, so that audit output shows exactly what was granted.
/// Tokens outside the known vocabulary are preserved but never grant anything.
///
/// # Example
///
/// ```
/// use vault_policy::rules::PolicyRule;
/// use vault_policy::capabilities::Capability;
///
/// let rule = PolicyRule::new("secret/*").with_capabilities(["read", "list"]);
/// assert!(rule.has_capability(Capability::Read));
/// assert!(rule.matches_path("secret/app/db"));
/// assert!(!rule.matches_path("secret"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PolicyRule {
    /// Path pattern, possibly ending in `*` or containing `+` segments.
    pub path: String,
    /// Capability tokens in declaration order.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl PolicyRule {
    /// Create a rule with no capabilities.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            capabilities: Vec::new(),
        }
    }

    /// Set the capability tokens, dropping duplicates but keeping order.
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities.clear();
        for capability in capabilities {
            let capability = capability.into();
            if !self.capabilities.contains(&capability) {
                self.capabilities.push(capability);
            }
        }
        self
    }

    /// The recognised capabilities of this rule.
    pub fn capability_set(&self) -> Vec<Capability> {
        self.capabilities
            .iter()
            .filter_map(|token| Capability::parse(token))
            .collect()
    }

    /// Check if the rule lists a capability.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capability_set().contains(&capability)
    }

    /// Check if the rule explicitly denies its path.
    pub fn is_deny(&self) -> bool {
        self.has_capability(Capability::Deny)
    }

    /// Check if the rule's pattern uses `*` or `+`.
    pub fn is_glob(&self) -> bool {
        self.path.ends_with('*') || self.path.split('/').any(|segment| segment == "+")
    }

    /// Check if a concrete request path is covered by this rule's pattern.
    pub fn matches_path(&self, path: &str) -> bool {
        glob_matches(&self.path, path)
    }
}

/// Match a request path against a Vault path pattern.
///
/// A trailing `*` turns the pattern into a prefix match. A segment consisting
/// of `+` matches exactly one non-empty path segment.
pub fn glob_matches(pattern: &str, path: &str) -> bool {
    let (pattern, is_prefix) = match pattern.strip_suffix('*') {
        Some(stripped) => (stripped, true),
        None => (pattern, false),
    };

    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();

    if is_prefix {
        if path_segments.len() < pattern_segments.len() {
            return false;
        }
        let last = pattern_segments.len() - 1;
        pattern_segments.iter().enumerate().all(|(i, expected)| {
            let actual = path_segments[i];
            if i == last {
                actual.starts_with(expected) || (*expected == "+" && !actual.is_empty())
            } else {
                segment_matches(expected, actual)
            }
        })
    } else {
        pattern_segments.len() == path_segments.len()
            && pattern_segments
                .iter()
                .zip(path_segments.iter())
                .all(|(expected, actual)| segment_matches(expected, actual))
    }
}

fn segment_matches(expected: &str, actual: &str) -> bool {
    if expected == "+" {
        !actual.is_empty()
    } else {
        expected == actual
    }
}

/// Ordering key for choosing between overlapping patterns.
///
/// Later wildcards, no trailing glob, fewer `+` segments and longer patterns
/// win, with lexical order breaking remaining ties.
fn specificity(pattern: &str) -> (usize, bool, Reverse<usize>, usize, &str) {
    let first_wildcard = pattern
        .find(|c: char| c == '*' || c == '+')
        .unwrap_or(pattern.len());
    let plus_segments = pattern.split('/').filter(|segment| *segment == "+").count();
    (
        first_wildcard,
        !pattern.ends_with('*'),
        Reverse(plus_segments),
        pattern.len(),
        pattern,
    )
}

/// An ordered, duplicate-free collection of rules.
///
/// Rule sets hold the union of every rule granted to a principal. Identical
/// rules contributed by several policies appear once.
///
/// # Example
///
/// ```
/// use vault_policy::rules::{PolicyRule, RuleSet};
/// use vault_policy::capabilities::Capability;
///
/// let mut set = RuleSet::new();
/// set.add(PolicyRule::new("secret/*").with_capabilities(["read"]));
/// set.add(PolicyRule::new("secret/admin/*").with_capabilities(["deny"]));
///
/// assert!(set.allows("secret/app", Capability::Read));
/// assert!(!set.allows("secret/admin/root", Capability::Read));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<PolicyRule>,
}

impl RuleSet {
    /// Create a new empty rule set.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule, returning `false` if an identical rule is already present.
    pub fn add(&mut self, rule: PolicyRule) -> bool {
        if self.rules.contains(&rule) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    /// Add multiple rules.
    pub fn add_all<I>(&mut self, rules: I)
    where
        I: IntoIterator<Item = PolicyRule>,
    {
        for rule in rules {
            self.add(rule);
        }
    }

    /// Merge another rule set into this one.
    pub fn merge(&mut self, other: &RuleSet) {
        for rule in &other.rules {
            self.add(rule.clone());
        }
    }

    /// The rules in insertion order.
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Iterate over the rules.
    pub fn iter(&self) -> std::slice::Iter<'_, PolicyRule> {
        self.rules.iter()
    }

    /// Get the count of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rules whose pattern covers the given path.
    pub fn matching(&self, path: &str) -> Vec<&PolicyRule> {
        self.rules.iter().filter(|rule| rule.matches_path(path)).collect()
    }

    /// Compute the capabilities granted on a concrete path.
    ///
    /// Only the most specific matching pattern applies. Rules with that exact
    /// pattern are merged (several policies may declare the same path). A
    /// merged `deny` empties the result.
    pub fn capabilities_for(&self, path: &str) -> Vec<Capability> {
        let matching = self.matching(path);
        let Some(winner) = matching
            .iter()
            .map(|rule| rule.path.as_str())
            .max_by_key(|pattern| specificity(*pattern))
        else {
            return Vec::new();
        };

        let mut merged: Vec<Capability> = Vec::new();
        for rule in matching.iter().filter(|rule| rule.path == winner) {
            for capability in rule.capability_set() {
                if !merged.contains(&capability) {
                    merged.push(capability);
                }
            }
        }

        if merged.iter().any(Capability::is_deny) {
            return Vec::new();
        }
        merged
    }

    /// Check if a capability is granted on a path.
    pub fn allows(&self, path: &str, capability: Capability) -> bool {
        self.capabilities_for(path).contains(&capability)
    }
}

impl FromIterator<PolicyRule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = PolicyRule>>(iter: T) -> Self {
        let mut set = RuleSet::new();
        set.add_all(iter);
        set
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a PolicyRule;
    type IntoIter = std::slice::Iter<'a, PolicyRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_deduplicates_capabilities() {
        let rule = PolicyRule::new("secret/data").with_capabilities(["read", "list", "read"]);
        assert_eq!(rule.capabilities, vec!["read", "list"]);
    }

    #[test]
    fn test_unknown_tokens_are_kept_but_grant_nothing() {
        let rule = PolicyRule::new("secret/data").with_capabilities(["read", "frobnicate"]);
        assert_eq!(rule.capabilities.len(), 2);
        assert_eq!(rule.capability_set(), vec![Capability::Read]);
    }

    #[test]
    fn test_exact_pattern_matching() {
        assert!(glob_matches("secret/app", "secret/app"));
        assert!(!glob_matches("secret/app", "secret/app/db"));
        assert!(!glob_matches("secret/app", "secret"));
    }

    #[test]
    fn test_trailing_glob_is_prefix_match() {
        assert!(glob_matches("secret/*", "secret/app"));
        assert!(glob_matches("secret/*", "secret/app/db"));
        assert!(glob_matches("secret/*", "secret/"));
        assert!(!glob_matches("secret/*", "secret"));
        assert!(glob_matches("secret*", "secrets/app"));
        assert!(glob_matches("*", "anything/at/all"));
    }

    #[test]
    fn test_plus_matches_one_segment() {
        assert!(glob_matches("secret/+/config", "secret/app/config"));
        assert!(!glob_matches("secret/+/config", "secret/app/db/config"));
        assert!(!glob_matches("secret/+/config", "secret//config"));
        assert!(glob_matches("secret/+/*", "secret/app/db/password"));
    }

    #[test]
    fn test_rule_set_deduplicates() {
        let mut set = RuleSet::new();
        assert!(set.add(PolicyRule::new("a").with_capabilities(["read"])));
        assert!(!set.add(PolicyRule::new("a").with_capabilities(["read"])));
        assert!(set.add(PolicyRule::new("a").with_capabilities(["list"])));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_most_specific_pattern_wins() {
        let set: RuleSet = vec![
            PolicyRule::new("secret/*").with_capabilities(["read", "list"]),
            PolicyRule::new("secret/app/*").with_capabilities(["update"]),
            PolicyRule::new("secret/app/db").with_capabilities(["delete"]),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            set.capabilities_for("secret/other"),
            vec![Capability::Read, Capability::List]
        );
        assert_eq!(set.capabilities_for("secret/app/cache"), vec![Capability::Update]);
        assert_eq!(set.capabilities_for("secret/app/db"), vec![Capability::Delete]);
        assert!(set.capabilities_for("auth/token").is_empty());
    }

    #[test]
    fn test_same_pattern_from_several_policies_is_merged() {
        let set: RuleSet = vec![
            PolicyRule::new("kv/*").with_capabilities(["read"]),
            PolicyRule::new("kv/*").with_capabilities(["list"]),
        ]
        .into_iter()
        .collect();

        assert!(set.allows("kv/app", Capability::Read));
        assert!(set.allows("kv/app", Capability::List));
        assert!(!set.allows("kv/app", Capability::Update));
    }

    #[test]
    fn test_deny_overrides_merged_capabilities() {
        let set: RuleSet = vec![
            PolicyRule::new("kv/*").with_capabilities(["read"]),
            PolicyRule::new("kv/*").with_capabilities(["deny"]),
        ]
        .into_iter()
        .collect();

        assert!(set.capabilities_for("kv/app").is_empty());
    }

    #[test]
    fn test_merge_rule_sets() {
        let mut first: RuleSet = vec![PolicyRule::new("a").with_capabilities(["read"])]
            .into_iter()
            .collect();
        let second: RuleSet = vec![
            PolicyRule::new("a").with_capabilities(["read"]),
            PolicyRule::new("b").with_capabilities(["list"]),
        ]
        .into_iter()
        .collect();

        first.merge(&second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.rules()[1].path, "b");
    }

    #[test]
    fn test_rule_set_serializes_as_list() {
        let set: RuleSet = vec![PolicyRule::new("secret/*").with_capabilities(["read"])]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "path": "secret/*", "capabilities": ["read"] }])
        );
    }
}
