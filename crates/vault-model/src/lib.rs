//! # Vault Model
//!
//! Scan-scoped records describing the authorization surface of a Vault
//! deployment.
//!
//! ## Overview
//!
//! The vault-model crate handles:
//! - **Namespaces**: The namespace tree and the per-request namespace context
//! - **Mounts**: Secret engine mounts and how their keys are listed
//! - **Secrets**: Folder and leaf nodes below a mount, with KV v2 version metadata
//! - **Principals**: Users, identity entities, groups and service roles
//! - **Auth**: Enabled auth methods and where their accounts live
//! - **MFA**: Login MFA methods and enforcements
//! - **Audit**: Enabled audit devices
//! - **Policies**: ACL and governing policy documents
//! - **Permissions**: The effective permissions resolved for a principal
//! - **Cluster**: Version, seal and license facts
//!
//! ## Architecture
//!
//! ```text
//! Namespace
//!   ├─ Mount
//!   │    └─ SecretNode (folder / leaf + VersionMetadata)
//!   ├─ Policy ─→ PolicyRule*
//!   ├─ AuthMount ─→ Principal ─→ EffectivePermission
//!   ├─ MfaMethod ←─ MfaEnforcement
//!   └─ AuditDevice
//! ```
//!
//! All records are plain values. They are produced once per scan and never
//! mutated afterwards; references between them (group ids, policy names) may
//! dangle.
//!
//! ## Usage
//!
//! ```rust
//! use vault_model::{EngineType, Mount, Namespace, SecretNode};
//!
//! let root = Namespace::root("");
//! let team = Namespace::child(&root, "team/", None, Default::default());
//!
//! let mount = Mount::new("kv/", EngineType::Kv, team.path.clone())
//!     .with_version(Some("2".to_string()));
//! let node = SecretNode::folder(&mount, "app/");
//!
//! assert_eq!(node.full_path, "kv/app/");
//! assert_eq!(node.namespace, "team/");
//! ```

pub mod audit;
pub mod auth;
pub mod cluster;
pub mod mfa;
pub mod mount;
pub mod namespace;
pub mod permission;
pub mod policy;
pub mod principal;
pub mod secret;

// Re-export main types for convenience
pub use audit::AuditDevice;
pub use auth::AuthMount;
pub use cluster::{ClusterInfo, LicenseInfo};
pub use mfa::{MfaEnforcement, MfaMethod};
pub use mount::{EngineType, ListingConvention, Mount};
pub use namespace::{Namespace, NamespaceContext};
pub use permission::EffectivePermission;
pub use policy::Policy;
pub use principal::{
    AuthMethod, EntityAlias, Group, IdentityEntity, LocalUser, Principal, PrincipalKind,
    ServiceRole,
};
pub use secret::{parse_timestamp, SecretNode, VersionMetadata};
