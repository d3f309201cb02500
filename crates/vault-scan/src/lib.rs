//! # Vault Scan
//!
//! Enumerates the authorization surface of a HashiCorp Vault deployment and
//! resolves, for every principal, the policies and path rules that reach it.
//!
//! ## Overview
//!
//! The vault-scan crate handles:
//! - **Client**: Namespace-aware read access to the Vault HTTP API
//! - **Namespaces**: Depth-first discovery of the namespace tree
//! - **Mounts**: Secret engine enumeration with an engine allow-list
//! - **Secrets**: Folder and leaf traversal below each mount
//! - **Auth methods**: Enabled auth mounts, wherever they are mounted
//! - **Identity**: Users, entities, groups and service roles
//! - **Policies**: ACL and governing policy documents
//! - **Permissions**: Effective policies through group inheritance
//! - **MFA**: Login MFA methods and their enforcements
//! - **Audit**: Audit devices of the scan root
//! - **Diagnostics**: A record of everything that could not be read
//!
//! ## Architecture
//!
//! ```text
//! Scanner
//!   ├─ NamespaceWalker ──────────────┐
//!   │                                ▼ per namespace
//!   ├─ enumerate_mounts ─→ SecretWalker
//!   ├─ collect_policies ─────────────┐
//!   ├─ enumerate_auth_mounts ─→ IdentityGraphBuilder ─→ PermissionResolver
//!   ├─ collect_mfa
//!   └─ enumerate_audit_devices
//!                 │
//!            VaultApi (HttpVaultClient + retry)
//! ```
//!
//! The scanner never writes to Vault. Every request carries its namespace
//! explicitly, so components hold no shared session state.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use vault_scan::{ScanConfig, Scanner, VaultEndpoint};
//!
//! async fn audit() -> Result<(), vault_scan::ScanError> {
//!     let endpoint = VaultEndpoint::new("https://vault.example.com:8200", "hvs.token");
//!     let scanner = Scanner::from_endpoint(endpoint, ScanConfig::default())?;
//!
//!     let snapshot = scanner.scan(&CancellationToken::new()).await?;
//!     for permission in &snapshot.permissions {
//!         println!(
//!             "{} {} → {:?}",
//!             permission.namespace, permission.display_name, permission.effective_policies
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! `VaultEndpoint::from_env()` and `ScanConfig::from_env()` read:
//! - `VAULT_ADDR`, `VAULT_TOKEN`, `VAULT_TIMEOUT_SECS`, `VAULT_MAX_RETRIES`,
//!   `VAULT_SKIP_VERIFY`
//! - `VAULT_NAMESPACE`, `SCAN_FOLLOW_CHILD_NAMESPACES`, `SCAN_MAX_DEPTH`,
//!   `SCAN_GROUP_INHERITANCE`

pub mod audit;
pub mod client;
pub mod cluster;
pub mod diagnostics;
pub mod identity;
pub mod mfa;
pub mod mounts;
pub mod policies;
pub mod resolver;
pub mod retry;
pub mod scanner;
pub mod walk;

// Re-export main types
pub use audit::enumerate_audit_devices;
pub use client::{
    fetch_document, ApiError, ApiResult, ConfigError, GroupInheritance, HttpVaultClient,
    ScanConfig, VaultApi, VaultEndpoint,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use identity::IdentityGraphBuilder;
pub use mfa::{collect_mfa, MfaConfig};
pub use mounts::{enumerate_auth_mounts, enumerate_mounts};
pub use policies::collect_policies;
pub use resolver::PermissionResolver;
pub use retry::RetryConfig;
pub use scanner::{ScanError, ScanResult, ScanSnapshot, Scanner};
pub use walk::{NamespaceWalker, SecretWalker};

// Re-export the record types scans produce
pub use vault_model::{
    AuditDevice, AuthMount, ClusterInfo, EffectivePermission, MfaEnforcement, MfaMethod, Mount,
    Namespace, NamespaceContext, Policy, Principal, SecretNode,
};
pub use vault_policy::{Capability, PolicyKind, PolicyRule, RuleSet};
