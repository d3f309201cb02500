//! Login MFA configuration
//!
//! MFA methods (TOTP, Duo, Okta, PingID) and the login enforcements that bind
//! them to auth mounts, groups and entities. Method secrets are never kept.

use serde::{Deserialize, Serialize};

use crate::auth::AuthMount;

/// A configured login MFA method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MfaMethod {
    pub id: String,
    pub name: String,
    /// `totp`, `duo`, `okta` or `pingid`
    pub method_type: String,
    pub namespace: String,
    pub mount_accessor: Option<String>,
}

/// A login enforcement: which logins must pass which MFA methods.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MfaEnforcement {
    pub id: String,
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub mfa_method_ids: Vec<String>,
    #[serde(default)]
    pub auth_method_accessors: Vec<String>,
    #[serde(default)]
    pub auth_method_types: Vec<String>,
    #[serde(default)]
    pub identity_group_ids: Vec<String>,
    #[serde(default)]
    pub identity_entity_ids: Vec<String>,
}

impl MfaEnforcement {
    /// Check if logins through an auth mount are enforced.
    pub fn covers_mount(&self, mount: &AuthMount) -> bool {
        let by_accessor = mount
            .accessor
            .as_ref()
            .is_some_and(|accessor| self.auth_method_accessors.contains(accessor));
        let by_type = self
            .auth_method_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&mount.method_type));
        by_accessor || by_type
    }

    /// Check if an entity is enforced, directly or through one of its groups.
    pub fn covers_entity(&self, entity_id: &str, group_ids: &[String]) -> bool {
        self.identity_entity_ids.iter().any(|id| id == entity_id)
            || group_ids.iter().any(|id| self.identity_group_ids.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enforcement() -> MfaEnforcement {
        MfaEnforcement {
            id: "enf-1".into(),
            name: "admins".into(),
            mfa_method_ids: vec!["m-1".into()],
            auth_method_accessors: vec!["auth_userpass_1".into()],
            auth_method_types: vec!["oidc".into()],
            identity_group_ids: vec!["g-admins".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_covers_mount_by_accessor_or_type() {
        let enforcement = enforcement();
        let userpass = AuthMount::new("userpass/", "userpass", "").with_accessor("auth_userpass_1");
        let other_userpass = AuthMount::new("corp/", "userpass", "").with_accessor("auth_userpass_2");
        let oidc = AuthMount::new("sso/", "OIDC", "");

        assert!(enforcement.covers_mount(&userpass));
        assert!(!enforcement.covers_mount(&other_userpass));
        assert!(enforcement.covers_mount(&oidc));
    }

    #[test]
    fn test_covers_entity_through_group() {
        let enforcement = enforcement();
        assert!(enforcement.covers_entity("e-1", &["g-admins".to_string()]));
        assert!(!enforcement.covers_entity("e-1", &["g-dev".to_string()]));
    }
}
