//! Policy documents

use serde::{Deserialize, Serialize};
use vault_policy::{parse_policy, PolicyKind, PolicyRule, RuleSet};

/// A named policy as stored in a namespace.
///
/// ACL policies are parsed into rules on construction. Governing policies are
/// Sentinel code and keep an empty rule list.
///
/// # Examples
///
/// ```
/// use vault_model::Policy;
/// use vault_policy::PolicyKind;
///
/// let policy = Policy::new("default", PolicyKind::Acl, r#"path "secret/*" { capabilities = ["read"] }"#, "");
/// assert_eq!(policy.rules.len(), 1);
///
/// let sentinel = Policy::new("business-hours", PolicyKind::EndpointGoverning, "main = rule { true }", "");
/// assert!(sentinel.rules.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    pub name: String,
    pub kind: PolicyKind,
    /// Policy text exactly as stored
    pub raw_text: String,
    /// Path of the namespace the policy lives in
    pub namespace: String,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
    /// `advisory`, `soft-mandatory` or `hard-mandatory` (governing kinds only)
    pub enforcement_level: Option<String>,
}

impl Policy {
    pub fn new(
        name: impl Into<String>,
        kind: PolicyKind,
        raw_text: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        let raw_text = raw_text.into();
        let rules = if kind.has_path_rules() {
            parse_policy(&raw_text)
        } else {
            Vec::new()
        };

        Self {
            name: name.into(),
            kind,
            raw_text,
            namespace: namespace.into(),
            rules,
            enforcement_level: None,
        }
    }

    /// Set the enforcement level. Ignored for ACL policies.
    pub fn with_enforcement_level(mut self, level: Option<String>) -> Self {
        if !self.kind.has_path_rules() {
            self.enforcement_level = level.filter(|level| !level.is_empty());
        }
        self
    }

    /// The policy's rules as a rule set.
    pub fn rule_set(&self) -> RuleSet {
        self.rules.iter().cloned().collect()
    }

    /// Ordering key for reports: kind, then name.
    pub fn sort_key(&self) -> (PolicyKind, &str) {
        (self.kind, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_policy::Capability;

    const DEFAULT_POLICY: &str = r#"
# Allow tokens to look up their own properties
path "auth/token/lookup-self" {
    capabilities = ["read"]
}

path "secret/*" {
    capabilities = ["read", "list"]
}
"#;

    #[test]
    fn test_acl_policy_is_parsed() {
        let policy = Policy::new("default", PolicyKind::Acl, DEFAULT_POLICY, "");
        assert_eq!(policy.rules.len(), 2);
        assert_eq!(policy.raw_text, DEFAULT_POLICY);
        assert!(policy.rule_set().allows("secret/app", Capability::List));
        assert!(policy.enforcement_level.is_none());
    }

    #[test]
    fn test_governing_policy_keeps_text_only() {
        let policy = Policy::new("cidr-check", PolicyKind::RoleGoverning, DEFAULT_POLICY, "team/")
            .with_enforcement_level(Some("hard-mandatory".to_string()));
        assert!(policy.rules.is_empty());
        assert_eq!(policy.enforcement_level.as_deref(), Some("hard-mandatory"));
        assert_eq!(policy.namespace, "team/");
    }

    #[test]
    fn test_acl_ignores_enforcement_level() {
        let policy = Policy::new("default", PolicyKind::Acl, "", "")
            .with_enforcement_level(Some("advisory".to_string()));
        assert!(policy.enforcement_level.is_none());
    }
}
