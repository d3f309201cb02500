//! Effective permissions
//!
//! The resolved view of one principal: which policies reach it and which
//! path rules those policies add up to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use vault_policy::{Capability, RuleSet};

use crate::principal::PrincipalKind;

/// Effective permissions of a principal.
///
/// `effective_policies` is always `direct_policies ∪ inherited_policies`, and
/// the two never overlap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectivePermission {
    pub principal_id: String,
    pub principal_kind: PrincipalKind,
    pub display_name: String,
    pub namespace: String,
    pub direct_policies: BTreeSet<String>,
    pub inherited_policies: BTreeSet<String>,
    pub effective_policies: BTreeSet<String>,
    /// Rules of every resolvable effective policy, in policy name order
    pub resolved_rules: RuleSet,
}

impl EffectivePermission {
    /// Check if a policy reaches the principal, directly or inherited.
    pub fn has_policy(&self, name: &str) -> bool {
        self.effective_policies.contains(name)
    }

    /// Check if the principal holds a capability on a path.
    pub fn allows(&self, path: &str, capability: Capability) -> bool {
        self.resolved_rules.allows(path, capability)
    }

    /// Capabilities the principal holds on a path.
    pub fn capabilities_for(&self, path: &str) -> Vec<Capability> {
        self.resolved_rules.capabilities_for(path)
    }
}
