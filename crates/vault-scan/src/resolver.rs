//! Effective permission resolution.
//!
//! ```text
//! principal.direct ──┐
//!                    ├─→ effective ──by name──→ Policy ──→ RuleSet
//! groups.direct ─────┘   (inherited)
//! ```
//!
//! Entities inherit from the groups they belong to and groups from their
//! parents. With [`GroupInheritance::Direct`] only that first level counts;
//! [`GroupInheritance::Transitive`] keeps following parent groups.

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;
use vault_model::{EffectivePermission, Group, NamespaceContext, Policy, Principal};
use vault_policy::{PolicyKind, RuleSet};

use crate::client::GroupInheritance;
use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Resolves principals of one namespace against that namespace's policies.
pub struct PermissionResolver<'a> {
    groups: HashMap<&'a str, &'a Group>,
    policies: HashMap<&'a str, &'a Policy>,
    inheritance: GroupInheritance,
    diagnostics: Option<Diagnostics>,
}

impl<'a> PermissionResolver<'a> {
    pub fn new(
        principals: &'a [Principal],
        policies: &'a [Policy],
        inheritance: GroupInheritance,
    ) -> Self {
        let groups = principals
            .iter()
            .filter_map(|principal| match principal {
                Principal::Group(group) => Some((group.id.as_str(), group)),
                _ => None,
            })
            .collect();

        // ACL wins when several kinds share a name.
        let mut by_name: HashMap<&str, &Policy> = HashMap::new();
        for policy in policies {
            let replace = by_name.get(policy.name.as_str()).map_or(true, |existing| {
                existing.kind != PolicyKind::Acl && policy.kind == PolicyKind::Acl
            });
            if replace {
                by_name.insert(policy.name.as_str(), policy);
            }
        }

        Self {
            groups,
            policies: by_name,
            inheritance,
            diagnostics: None,
        }
    }

    /// Record dangling group references in `diagnostics`.
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Effective permissions of one principal.
    pub fn resolve(&self, principal: &Principal) -> EffectivePermission {
        let direct = principal.direct_policies().clone();
        let inherited: BTreeSet<String> = self
            .inherited_policies(principal)
            .into_iter()
            .filter(|name| !direct.contains(name))
            .collect();
        let effective: BTreeSet<String> = direct.union(&inherited).cloned().collect();

        let mut resolved_rules = RuleSet::new();
        for name in &effective {
            if let Some(policy) = self.policies.get(name.as_str()) {
                resolved_rules.add_all(policy.rules.iter().cloned());
            }
        }

        EffectivePermission {
            principal_id: principal.id().to_string(),
            principal_kind: principal.kind(),
            display_name: principal.display_name().to_string(),
            namespace: principal.namespace().to_string(),
            direct_policies: direct,
            inherited_policies: inherited,
            effective_policies: effective,
            resolved_rules,
        }
    }

    /// Effective permissions of every principal, in input order.
    pub fn resolve_all(&self, principals: &[Principal]) -> Vec<EffectivePermission> {
        principals.iter().map(|principal| self.resolve(principal)).collect()
    }

    fn inherited_policies(&self, principal: &Principal) -> BTreeSet<String> {
        let mut inherited = BTreeSet::new();
        let mut visited: HashSet<&str> = HashSet::new();
        if let Principal::Group(group) = principal {
            visited.insert(group.id.as_str());
        }

        let mut pending: Vec<&str> = principal.group_ids().iter().map(String::as_str).collect();
        while let Some(group_id) = pending.pop() {
            if !visited.insert(group_id) {
                continue;
            }

            let Some(group) = self.groups.get(group_id) else {
                self.dangling(principal, group_id);
                continue;
            };

            inherited.extend(group.direct_policies.iter().cloned());
            if self.inheritance == GroupInheritance::Transitive {
                pending.extend(group.parent_group_ids.iter().map(String::as_str));
            }
        }

        inherited
    }

    fn dangling(&self, principal: &Principal, group_id: &str) {
        debug!(
            principal = %principal.id(),
            group_id = %group_id,
            "Ignoring reference to unknown group"
        );
        if let Some(diagnostics) = &self.diagnostics {
            diagnostics.record(
                DiagnosticKind::NotFound,
                &NamespaceContext::new(principal.namespace()),
                format!("identity/group/id/{}", group_id),
                format!("group referenced by {} does not exist", principal.id()),
            );
        }
    }
}
