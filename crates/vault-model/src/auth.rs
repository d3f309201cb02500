//! Auth method mounts
//!
//! Users and roles live below the mount an auth method is enabled at, which
//! is not necessarily the method's default path. `sys/auth` says where each
//! method is mounted.

use serde::{Deserialize, Serialize};

use crate::namespace::normalize_path;
use crate::principal::AuthMethod;

/// An enabled auth method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthMount {
    /// Mount path below `auth/`, slash-terminated (e.g. `userpass/`)
    pub path: String,
    /// Method type as reported by `sys/auth` (e.g. `userpass`, `approle`)
    pub method_type: String,
    pub namespace: String,
    pub accessor: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub seal_wrap: bool,
}

impl AuthMount {
    pub fn new(
        path: impl AsRef<str>,
        method_type: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            method_type: method_type.into(),
            namespace: namespace.into(),
            accessor: None,
            description: String::new(),
            local: false,
            seal_wrap: false,
        }
    }

    /// Builder: set the mount accessor. Blank accessors are dropped.
    pub fn with_accessor(mut self, accessor: impl Into<String>) -> Self {
        self.accessor = Some(accessor.into()).filter(|a| !a.is_empty());
        self
    }

    /// Builder: set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check if this mount holds userpass accounts.
    pub fn is_userpass(&self) -> bool {
        self.method_type.eq_ignore_ascii_case("userpass")
    }

    /// The role-bearing method of this mount, if any.
    pub fn role_method(&self) -> Option<AuthMethod> {
        AuthMethod::from_type(&self.method_type)
    }

    /// API path listing the accounts of the mount: `users` for userpass,
    /// `role` for role-bearing methods.
    pub fn accounts_path(&self) -> Option<String> {
        if self.is_userpass() {
            Some(format!("auth/{}users", self.path))
        } else {
            self.role_method().map(|_| format!("auth/{}role", self.path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accounts_path_follows_mount() {
        let users = AuthMount::new("corp-users", "userpass", "");
        assert_eq!(users.path, "corp-users/");
        assert_eq!(users.accounts_path().as_deref(), Some("auth/corp-users/users"));

        let roles = AuthMount::new("ci/approle/", "approle", "team/");
        assert_eq!(roles.role_method(), Some(AuthMethod::AppRole));
        assert_eq!(roles.accounts_path().as_deref(), Some("auth/ci/approle/role"));

        let token = AuthMount::new("token/", "token", "");
        assert_eq!(token.accounts_path(), None);
    }

    #[test]
    fn test_blank_accessor_is_dropped() {
        assert_eq!(AuthMount::new("oidc/", "oidc", "").with_accessor("").accessor, None);
        assert_eq!(
            AuthMount::new("oidc/", "oidc", "").with_accessor("auth_oidc_1").accessor.as_deref(),
            Some("auth_oidc_1")
        );
    }
}
