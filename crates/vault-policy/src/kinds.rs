//! # Policy Kinds
//!
//! Vault stores three kinds of policy documents side by side. Only ACL
//! policies carry path rules; the governing kinds hold Sentinel code and are
//! an Enterprise feature.

use serde::{Deserialize, Serialize};

/// The kind of a policy document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Access-control list policy written in the path/capabilities DSL.
    Acl,
    /// Role governing policy (Sentinel, attached to tokens and identities).
    RoleGoverning,
    /// Endpoint governing policy (Sentinel, attached to request paths).
    EndpointGoverning,
}

impl PolicyKind {
    /// Get the short name Vault uses for the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Acl => "acl",
            PolicyKind::RoleGoverning => "rgp",
            PolicyKind::EndpointGoverning => "egp",
        }
    }

    /// Parse a kind from its short or long name.
    ///
    /// # Example
    ///
    /// ```
    /// use vault_policy::kinds::PolicyKind;
    ///
    /// assert_eq!(PolicyKind::parse("acl"), Some(PolicyKind::Acl));
    /// assert_eq!(PolicyKind::parse("role_governing"), Some(PolicyKind::RoleGoverning));
    /// assert_eq!(PolicyKind::parse("sentinel"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "acl" => Some(PolicyKind::Acl),
            "rgp" | "role_governing" => Some(PolicyKind::RoleGoverning),
            "egp" | "endpoint_governing" => Some(PolicyKind::EndpointGoverning),
            _ => None,
        }
    }

    /// Get all kinds, ACL first.
    pub fn all() -> Vec<Self> {
        vec![
            PolicyKind::Acl,
            PolicyKind::RoleGoverning,
            PolicyKind::EndpointGoverning,
        ]
    }

    /// The `sys/` path under which policies of this kind are listed and read.
    pub fn sys_path(&self) -> &'static str {
        match self {
            PolicyKind::Acl => "sys/policies/acl",
            PolicyKind::RoleGoverning => "sys/policies/rgp",
            PolicyKind::EndpointGoverning => "sys/policies/egp",
        }
    }

    /// Whether documents of this kind are written in the path rule DSL.
    pub fn has_path_rules(&self) -> bool {
        matches!(self, PolicyKind::Acl)
    }

    /// Whether this kind requires an Enterprise license.
    pub fn is_enterprise(&self) -> bool {
        !matches!(self, PolicyKind::Acl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!(PolicyKind::parse("ACL"), Some(PolicyKind::Acl));
        assert_eq!(PolicyKind::parse("rgp"), Some(PolicyKind::RoleGoverning));
        assert_eq!(PolicyKind::parse("egp"), Some(PolicyKind::EndpointGoverning));
        assert_eq!(PolicyKind::parse("unknown"), None);
    }

    #[test]
    fn test_sys_paths() {
        assert_eq!(PolicyKind::Acl.sys_path(), "sys/policies/acl");
        assert_eq!(PolicyKind::RoleGoverning.sys_path(), "sys/policies/rgp");
        assert_eq!(PolicyKind::EndpointGoverning.sys_path(), "sys/policies/egp");
    }

    #[test]
    fn test_only_acl_has_path_rules() {
        assert!(PolicyKind::Acl.has_path_rules());
        assert!(!PolicyKind::RoleGoverning.has_path_rules());
        assert!(!PolicyKind::EndpointGoverning.has_path_rules());

        assert!(!PolicyKind::Acl.is_enterprise());
        assert!(PolicyKind::EndpointGoverning.is_enterprise());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&PolicyKind::RoleGoverning).unwrap();
        assert_eq!(json, "\"role_governing\"");
    }
}
