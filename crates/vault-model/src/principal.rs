//! Identity principals
//!
//! Anything that can hold policies: userpass users, identity entities,
//! identity groups, and machine roles of the AppRole, Kubernetes and AWS auth
//! methods.
//!
//! ```text
//! IdentityEntity ──group_ids──→ Group ──parent_group_ids──→ Group
//!        │                        │
//!   direct_policies          direct_policies
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Mount path of the userpass method unless configured otherwise.
pub const DEFAULT_USERPASS_MOUNT: &str = "userpass/";

/// The kind of a principal. Ordering is the report ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    LocalUser,
    IdentityEntity,
    Group,
    ServiceRole,
}

impl PrincipalKind {
    /// Get the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::LocalUser => "local_user",
            PrincipalKind::IdentityEntity => "identity_entity",
            PrincipalKind::Group => "group",
            PrincipalKind::ServiceRole => "service_role",
        }
    }
}

/// Auth methods whose roles are scanned as service principals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    AppRole,
    Kubernetes,
    Aws,
}

impl AuthMethod {
    /// Get the default mount name of the auth method.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::AppRole => "approle",
            AuthMethod::Kubernetes => "kubernetes",
            AuthMethod::Aws => "aws",
        }
    }

    /// Map a `sys/auth` type to a role-bearing auth method.
    pub fn from_type(method_type: &str) -> Option<Self> {
        match method_type.trim().to_lowercase().as_str() {
            "approle" => Some(AuthMethod::AppRole),
            "kubernetes" => Some(AuthMethod::Kubernetes),
            "aws" => Some(AuthMethod::Aws),
            _ => None,
        }
    }

    /// Get all scanned auth methods.
    pub fn all() -> Vec<Self> {
        vec![AuthMethod::AppRole, AuthMethod::Kubernetes, AuthMethod::Aws]
    }

    /// Mount path the method is enabled at unless configured otherwise.
    pub fn default_mount(&self) -> String {
        format!("{}/", self.as_str())
    }
}

/// Principal id of an account on an auth mount: `<mount>-<name>`.
fn mount_scoped_id(mount_path: &str, name: &str) -> String {
    format!("{}-{}", mount_path.trim_end_matches('/'), name)
}

/// A principal with its directly assigned policies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    LocalUser(LocalUser),
    IdentityEntity(IdentityEntity),
    Group(Group),
    ServiceRole(ServiceRole),
}

impl Principal {
    pub fn id(&self) -> &str {
        match self {
            Principal::LocalUser(user) => &user.id,
            Principal::IdentityEntity(entity) => &entity.id,
            Principal::Group(group) => &group.id,
            Principal::ServiceRole(role) => &role.id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Principal::LocalUser(user) => &user.display_name,
            Principal::IdentityEntity(entity) => &entity.display_name,
            Principal::Group(group) => &group.display_name,
            Principal::ServiceRole(role) => &role.display_name,
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            Principal::LocalUser(user) => &user.namespace,
            Principal::IdentityEntity(entity) => &entity.namespace,
            Principal::Group(group) => &group.namespace,
            Principal::ServiceRole(role) => &role.namespace,
        }
    }

    pub fn direct_policies(&self) -> &BTreeSet<String> {
        match self {
            Principal::LocalUser(user) => &user.direct_policies,
            Principal::IdentityEntity(entity) => &entity.direct_policies,
            Principal::Group(group) => &group.direct_policies,
            Principal::ServiceRole(role) => &role.direct_policies,
        }
    }

    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::LocalUser(_) => PrincipalKind::LocalUser,
            Principal::IdentityEntity(_) => PrincipalKind::IdentityEntity,
            Principal::Group(_) => PrincipalKind::Group,
            Principal::ServiceRole(_) => PrincipalKind::ServiceRole,
        }
    }

    /// Groups this principal inherits policies from.
    ///
    /// Entities inherit from the groups they belong to, groups from their
    /// parent groups. Users and service roles inherit from nothing.
    pub fn group_ids(&self) -> &[String] {
        match self {
            Principal::IdentityEntity(entity) => &entity.group_ids,
            Principal::Group(group) => &group.parent_group_ids,
            Principal::LocalUser(_) | Principal::ServiceRole(_) => &[],
        }
    }

    /// Ordering key for reports: kind, then id.
    pub fn sort_key(&self) -> (PrincipalKind, &str) {
        (self.kind(), self.id())
    }
}

/// A userpass user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalUser {
    pub id: String,
    pub display_name: String,
    pub namespace: String,
    /// Userpass mount the account lives on, e.g. `userpass/`
    #[serde(default)]
    pub mount_path: String,
    /// Union of the user's `policies` and `token_policies`
    pub direct_policies: BTreeSet<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl LocalUser {
    /// Create a user on the default `userpass/` mount.
    pub fn new(username: impl Into<String>, namespace: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            id: mount_scoped_id(DEFAULT_USERPASS_MOUNT, &username),
            display_name: username,
            namespace: namespace.into(),
            mount_path: DEFAULT_USERPASS_MOUNT.to_string(),
            direct_policies: BTreeSet::new(),
            metadata: HashMap::new(),
        }
    }

    /// Place the user on another userpass mount; the id follows the mount.
    pub fn with_mount(mut self, mount_path: impl Into<String>) -> Self {
        self.mount_path = mount_path.into();
        self.id = mount_scoped_id(&self.mount_path, &self.display_name);
        self
    }

    /// Add policies. Blank names are ignored.
    pub fn with_policies<I, S>(mut self, policies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_policies(&mut self.direct_policies, policies);
        self
    }
}

/// An alias linking an identity entity to an auth method account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityAlias {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mount_accessor: String,
    #[serde(default)]
    pub mount_type: String,
}

/// An identity entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityEntity {
    pub id: String,
    pub display_name: String,
    pub namespace: String,
    pub direct_policies: BTreeSet<String>,
    #[serde(default)]
    pub group_ids: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<EntityAlias>,
    #[serde(default)]
    pub disabled: bool,
}

impl IdentityEntity {
    /// Create an entity.
    ///
    /// The display name is the first userpass alias name, else the entity
    /// name, else the id.
    ///
    /// # Examples
    ///
    /// ```
    /// use vault_model::principal::{EntityAlias, IdentityEntity};
    ///
    /// let alias = EntityAlias { name: "alice".into(), mount_type: "userpass".into(), ..Default::default() };
    /// let entity = IdentityEntity::new("e-1", Some("entity_4f2a".into()), "", vec![alias]);
    /// assert_eq!(entity.display_name, "alice");
    ///
    /// let anonymous = IdentityEntity::new("e-2", None, "", vec![]);
    /// assert_eq!(anonymous.display_name, "e-2");
    /// ```
    pub fn new(
        id: impl Into<String>,
        name: Option<String>,
        namespace: impl Into<String>,
        aliases: Vec<EntityAlias>,
    ) -> Self {
        let id = id.into();
        let display_name = aliases
            .iter()
            .find(|alias| alias.mount_type == "userpass" && !alias.name.is_empty())
            .map(|alias| alias.name.clone())
            .or(name.filter(|name| !name.is_empty()))
            .unwrap_or_else(|| id.clone());

        Self {
            id,
            display_name,
            namespace: namespace.into(),
            direct_policies: BTreeSet::new(),
            group_ids: Vec::new(),
            aliases,
            disabled: false,
        }
    }

    /// Add policies. Blank names are ignored.
    pub fn with_policies<I, S>(mut self, policies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_policies(&mut self.direct_policies, policies);
        self
    }

    /// Set the groups the entity is a direct member of.
    pub fn with_group_ids(mut self, group_ids: Vec<String>) -> Self {
        self.group_ids = group_ids;
        self
    }
}

/// An identity group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub id: String,
    pub display_name: String,
    pub namespace: String,
    pub direct_policies: BTreeSet<String>,
    #[serde(default)]
    pub member_entity_ids: Vec<String>,
    #[serde(default)]
    pub member_group_ids: Vec<String>,
    #[serde(default)]
    pub parent_group_ids: Vec<String>,
    /// `internal` or `external`
    #[serde(default)]
    pub group_type: String,
}

impl Group {
    /// Create a group. An empty name falls back to the id.
    pub fn new(id: impl Into<String>, name: Option<String>, namespace: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: name.filter(|name| !name.is_empty()).unwrap_or_else(|| id.clone()),
            id,
            namespace: namespace.into(),
            direct_policies: BTreeSet::new(),
            member_entity_ids: Vec::new(),
            member_group_ids: Vec::new(),
            parent_group_ids: Vec::new(),
            group_type: String::new(),
        }
    }

    /// Add policies. Blank names are ignored.
    pub fn with_policies<I, S>(mut self, policies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_policies(&mut self.direct_policies, policies);
        self
    }

    /// Set the parent groups.
    pub fn with_parent_group_ids(mut self, parent_group_ids: Vec<String>) -> Self {
        self.parent_group_ids = parent_group_ids;
        self
    }
}

/// A machine role of an auth method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceRole {
    pub id: String,
    pub display_name: String,
    pub namespace: String,
    /// Union of the role's `policies` and `token_policies`
    pub direct_policies: BTreeSet<String>,
    pub auth_method: AuthMethod,
    /// Auth mount the role is defined on, e.g. `approle/`
    #[serde(default)]
    pub mount_path: String,
    /// Token TTL in seconds
    pub token_ttl: Option<u64>,
    /// Token max TTL in seconds
    pub token_max_ttl: Option<u64>,
}

impl ServiceRole {
    /// Create a role on the method's default mount.
    pub fn new(auth_method: AuthMethod, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let name = name.into();
        let mount_path = auth_method.default_mount();
        Self {
            id: mount_scoped_id(&mount_path, &name),
            display_name: name,
            namespace: namespace.into(),
            direct_policies: BTreeSet::new(),
            auth_method,
            mount_path,
            token_ttl: None,
            token_max_ttl: None,
        }
    }

    /// Place the role on another mount of its method; the id follows the
    /// mount.
    pub fn with_mount(mut self, mount_path: impl Into<String>) -> Self {
        self.mount_path = mount_path.into();
        self.id = mount_scoped_id(&self.mount_path, &self.display_name);
        self
    }

    /// Add policies. Blank names are ignored.
    pub fn with_policies<I, S>(mut self, policies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_policies(&mut self.direct_policies, policies);
        self
    }
}

fn extend_policies<I, S>(target: &mut BTreeSet<String>, policies: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for policy in policies {
        let policy = policy.into();
        let policy = policy.trim();
        if !policy.is_empty() {
            target.insert(policy.to_string());
        }
    }
}
