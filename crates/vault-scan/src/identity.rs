//! Identity graph construction.
//!
//! Principals come from independent sources per namespace. A source that
//! cannot be read contributes nothing; the others are unaffected. Users and
//! roles are read below the mount each auth method is enabled at.
//!
//! ```text
//! auth/<userpass mount>users                 → LocalUser
//! identity/entity/id                         → IdentityEntity
//! identity/group/id                          → Group
//! auth/<approle|kubernetes|aws mount>role    → ServiceRole
//! ```

use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};
use vault_model::principal::DEFAULT_USERPASS_MOUNT;
use vault_model::{
    AuthMethod, AuthMount, Group, IdentityEntity, LocalUser, Namespace, NamespaceContext,
    Principal, ServiceRole,
};

use crate::client::documents::{EntityDocument, GroupDocument, RoleDocument, UserDocument};
use crate::client::{fetch_document, VaultApi};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::mounts::enumerate_auth_mounts;

const ENTITIES_PATH: &str = "identity/entity/id";
const GROUPS_PATH: &str = "identity/group/id";

/// Builds the principals of a namespace.
pub struct IdentityGraphBuilder<'a> {
    api: &'a dyn VaultApi,
    diagnostics: &'a Diagnostics,
}

impl<'a> IdentityGraphBuilder<'a> {
    pub fn new(api: &'a dyn VaultApi, diagnostics: &'a Diagnostics) -> Self {
        Self { api, diagnostics }
    }

    /// All principals of a namespace, sorted by kind then id.
    ///
    /// Auth mounts are read from `sys/auth` first.
    pub async fn build(&self, namespace: &Namespace) -> Vec<Principal> {
        let auth_mounts = enumerate_auth_mounts(self.api, self.diagnostics, namespace).await;
        self.build_from(namespace, auth_mounts.as_deref()).await
    }

    /// All principals of a namespace, given its auth mounts.
    ///
    /// With `None` (`sys/auth` unreadable) the methods' default mount paths
    /// are tried instead.
    #[instrument(skip(self, namespace, auth_mounts), fields(namespace = %namespace.context()))]
    pub async fn build_from(
        &self,
        namespace: &Namespace,
        auth_mounts: Option<&[AuthMount]>,
    ) -> Vec<Principal> {
        let defaults;
        let auth_mounts = match auth_mounts {
            Some(mounts) => mounts,
            None => {
                debug!("Auth mounts unknown, trying default mount paths");
                defaults = default_auth_mounts(namespace);
                &defaults
            }
        };

        let mut principals = Vec::new();
        for mount in auth_mounts.iter().filter(|m| m.is_userpass()) {
            principals.extend(self.local_users(namespace, mount).await);
        }
        principals.extend(self.entities(namespace).await);
        principals.extend(self.groups(namespace).await);
        for mount in auth_mounts {
            principals.extend(self.service_roles(namespace, mount).await);
        }

        principals.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        info!(count = principals.len(), "Built identity graph");
        principals
    }

    /// Users of a userpass mount; direct policies are
    /// `policies ∪ token_policies`.
    pub async fn local_users(&self, namespace: &Namespace, mount: &AuthMount) -> Vec<Principal> {
        let Some(users_path) = mount.accounts_path().filter(|_| mount.is_userpass()) else {
            return Vec::new();
        };
        let context = namespace.context();
        let mut users = Vec::new();

        for name in self.list(&users_path, &context).await {
            let path = format!("{}/{}", users_path, name);
            let Some(document) = self.read::<UserDocument>(&path, &context).await else {
                continue;
            };

            let mut user = LocalUser::new(name, namespace.path.clone())
                .with_mount(mount.path.clone())
                .with_policies(document.policies.iter().cloned())
                .with_policies(document.token_policies.iter().cloned());
            user.metadata = document.metadata();
            users.push(Principal::LocalUser(user));
        }
        users
    }

    /// Identity entities.
    pub async fn entities(&self, namespace: &Namespace) -> Vec<Principal> {
        let context = namespace.context();
        let mut entities = Vec::new();

        for id in self.list(ENTITIES_PATH, &context).await {
            let path = format!("{}/{}", ENTITIES_PATH, id);
            let Some(document) = self.read::<EntityDocument>(&path, &context).await else {
                continue;
            };

            let entity_id = if document.id.is_empty() { id } else { document.id };
            let mut entity = IdentityEntity::new(
                entity_id,
                Some(document.name),
                namespace.path.clone(),
                document.aliases,
            )
            .with_policies(document.policies)
            .with_group_ids(document.group_ids);
            entity.disabled = document.disabled;
            entities.push(Principal::IdentityEntity(entity));
        }
        entities
    }

    /// Identity groups.
    pub async fn groups(&self, namespace: &Namespace) -> Vec<Principal> {
        let context = namespace.context();
        let mut groups = Vec::new();

        for id in self.list(GROUPS_PATH, &context).await {
            let path = format!("{}/{}", GROUPS_PATH, id);
            let Some(document) = self.read::<GroupDocument>(&path, &context).await else {
                continue;
            };

            let group_id = if document.id.is_empty() { id } else { document.id };
            let mut group = Group::new(group_id, Some(document.name), namespace.path.clone())
                .with_policies(document.policies)
                .with_parent_group_ids(document.parent_group_ids);
            group.member_entity_ids = document.member_entity_ids;
            group.member_group_ids = document.member_group_ids;
            group.group_type = document.group_type;
            groups.push(Principal::Group(group));
        }
        groups
    }

    /// Roles of an AppRole, Kubernetes or AWS mount. Other mounts have none.
    pub async fn service_roles(&self, namespace: &Namespace, mount: &AuthMount) -> Vec<Principal> {
        let (Some(method), Some(roles_path)) = (mount.role_method(), mount.accounts_path()) else {
            return Vec::new();
        };
        let context = namespace.context();
        let mut roles = Vec::new();

        for name in self.list(&roles_path, &context).await {
            let path = format!("{}/{}", roles_path, name);
            let Some(document) = self.read::<RoleDocument>(&path, &context).await else {
                continue;
            };

            let mut role = ServiceRole::new(method, name, namespace.path.clone())
                .with_mount(mount.path.clone())
                .with_policies(document.policies)
                .with_policies(document.token_policies);
            role.token_ttl = document.token_ttl;
            role.token_max_ttl = document.token_max_ttl;
            roles.push(Principal::ServiceRole(role));
        }
        roles
    }

    async fn list(&self, path: &str, context: &NamespaceContext) -> Vec<String> {
        match self.api.list(path, context).await {
            Ok(keys) => {
                debug!(path = %path, count = keys.len(), "Listed principals");
                keys.into_iter()
                    .map(|key| key.trim_end_matches('/').to_string())
                    .filter(|key| !key.is_empty())
                    .collect()
            }
            Err(err) => {
                self.diagnostics.record_error(&err, context);
                Vec::new()
            }
        }
    }

    async fn read<T: DeserializeOwned>(&self, path: &str, context: &NamespaceContext) -> Option<T> {
        match fetch_document::<T, _>(self.api, path, context).await {
            Ok(Some(document)) => Some(document),
            Ok(None) => {
                self.diagnostics.record(
                    DiagnosticKind::NotFound,
                    context,
                    path,
                    "principal listed but not readable",
                );
                None
            }
            Err(err) => {
                self.diagnostics.record_error(&err, context);
                None
            }
        }
    }
}

/// Auth mounts at the default paths of the scanned methods.
fn default_auth_mounts(namespace: &Namespace) -> Vec<AuthMount> {
    let mut mounts = vec![AuthMount::new(DEFAULT_USERPASS_MOUNT, "userpass", namespace.path.clone())];
    mounts.extend(
        AuthMethod::all()
            .into_iter()
            .map(|method| AuthMount::new(method.default_mount(), method.as_str(), namespace.path.clone())),
    );
    mounts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeVault;
    use crate::client::ApiError;
    use serde_json::json;
    use vault_model::PrincipalKind;

    fn fixture() -> FakeVault {
        FakeVault::new()
            .with_list("", "auth/userpass/users", &["alice"])
            .with_document(
                "",
                "auth/userpass/users/alice",
                json!({"data": {"policies": ["default"], "token_policies": ["dev"], "token_type": "service"}}),
            )
            .with_list("", "identity/entity/id", &["e-1"])
            .with_document(
                "",
                "identity/entity/id/e-1",
                json!({"data": {
                    "id": "e-1",
                    "name": "entity_1",
                    "policies": ["audit"],
                    "group_ids": ["g-1"],
                    "aliases": [{"id": "a-1", "name": "alice", "mount_type": "userpass", "mount_accessor": "auth_userpass_1"}],
                    "disabled": false
                }}),
            )
            .with_list("", "identity/group/id", &["g-1"])
            .with_document(
                "",
                "identity/group/id/g-1",
                json!({"data": {
                    "id": "g-1",
                    "name": "ops",
                    "policies": ["ops"],
                    "member_entity_ids": ["e-1"],
                    "parent_group_ids": null,
                    "type": "internal"
                }}),
            )
            .with_list("", "auth/approle/role", &["ci"])
            .with_document(
                "",
                "auth/approle/role/ci",
                json!({"data": {"token_policies": ["ci"], "token_ttl": 600}}),
            )
    }

    #[tokio::test]
    async fn test_builds_all_principal_kinds() {
        let api = fixture();
        let diagnostics = Diagnostics::new();

        let principals = IdentityGraphBuilder::new(&api, &diagnostics)
            .build(&Namespace::root(""))
            .await;

        let kinds: Vec<PrincipalKind> = principals.iter().map(Principal::kind).collect();
        assert_eq!(
            kinds,
            vec![
                PrincipalKind::LocalUser,
                PrincipalKind::IdentityEntity,
                PrincipalKind::Group,
                PrincipalKind::ServiceRole
            ]
        );

        let user = &principals[0];
        assert_eq!(user.id(), "userpass-alice");
        assert!(user.direct_policies().contains("default"));
        assert!(user.direct_policies().contains("dev"));

        let Principal::IdentityEntity(entity) = &principals[1] else {
            panic!("expected an entity");
        };
        assert_eq!(entity.display_name, "alice");
        assert_eq!(entity.group_ids, vec!["g-1"]);

        let Principal::Group(group) = &principals[2] else {
            panic!("expected a group");
        };
        assert_eq!(group.display_name, "ops");
        assert!(group.parent_group_ids.is_empty());
        assert_eq!(group.group_type, "internal");

        let Principal::ServiceRole(role) = &principals[3] else {
            panic!("expected a role");
        };
        assert_eq!(role.auth_method, AuthMethod::AppRole);
        assert_eq!(role.token_ttl, Some(600));
        assert!(role.direct_policies.contains("ci"));
    }

    #[tokio::test]
    async fn test_sources_fail_independently() {
        let api = fixture().with_error(
            "",
            "identity/entity/id",
            ApiError::PermissionDenied {
                path: "identity/entity/id".into(),
            },
        );
        let diagnostics = Diagnostics::new();

        let principals = IdentityGraphBuilder::new(&api, &diagnostics)
            .build(&Namespace::root(""))
            .await;

        assert_eq!(principals.len(), 3);
        assert!(principals.iter().all(|p| p.kind() != PrincipalKind::IdentityEntity));
        assert_eq!(diagnostics.count(DiagnosticKind::FeatureUnavailable), 1);
    }

    #[tokio::test]
    async fn test_accounts_read_from_enabled_mounts() {
        let api = FakeVault::new()
            .with_document(
                "",
                "sys/auth",
                json!({"data": {
                    "token/": {"type": "token"},
                    "corp-users/": {"type": "userpass", "accessor": "auth_userpass_9"},
                    "ci/": {"type": "approle"}
                }}),
            )
            .with_list("", "auth/corp-users/users", &["alice"])
            .with_document("", "auth/corp-users/users/alice", json!({"data": {"policies": ["staff"]}}))
            .with_list("", "auth/ci/role", &["deploy"])
            .with_document("", "auth/ci/role/deploy", json!({"data": {"token_policies": "deploy,default"}}))
            // not enabled, so never read
            .with_list("", "auth/userpass/users", &["stale"]);
        let diagnostics = Diagnostics::new();

        let principals = IdentityGraphBuilder::new(&api, &diagnostics)
            .build(&Namespace::root(""))
            .await;

        let ids: Vec<&str> = principals.iter().map(Principal::id).collect();
        assert_eq!(ids, vec!["corp-users-alice", "ci-deploy"]);

        let Principal::ServiceRole(role) = &principals[1] else {
            panic!("expected a role");
        };
        assert_eq!(role.auth_method, AuthMethod::AppRole);
        assert_eq!(role.mount_path, "ci/");
        assert!(role.direct_policies.contains("deploy"));
        assert!(!api.calls().iter().any(|call| call.contains("auth/userpass/")));
        assert!(!api.calls().iter().any(|call| call.contains("auth/token/")));
    }

    #[tokio::test]
    async fn test_missing_detail_is_skipped() {
        let api = FakeVault::new().with_list("", "auth/userpass/users", &["ghost"]);
        let diagnostics = Diagnostics::new();
        let mount = AuthMount::new("userpass/", "userpass", "");

        let users = IdentityGraphBuilder::new(&api, &diagnostics)
            .local_users(&Namespace::root(""), &mount)
            .await;
        assert!(users.is_empty());
        assert_eq!(diagnostics.count(DiagnosticKind::NotFound), 1);
    }
}
