//! Scan orchestration.
//!
//! The scanner drives the components in a fixed order:
//!
//! ```text
//! preflight ─→ cluster info ─→ audit devices ─→ namespaces
//!                                 └─ per namespace: mounts ─→ secrets
//!                                                   policies
//!                                                   auth mounts ─→ principals ─→ permissions
//!                                                   mfa
//! ```
//!
//! Every operation re-traverses from scratch and starts with an empty
//! diagnostic channel. Only configuration errors, a rejected token and
//! cancellation end a scan early; everything else becomes a [`Diagnostic`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use vault_model::{
    AuditDevice, AuthMount, ClusterInfo, EffectivePermission, MfaEnforcement, MfaMethod, Mount,
    Namespace, Policy, Principal, SecretNode,
};

use crate::client::{
    ApiError, ConfigError, HttpVaultClient, ScanConfig, VaultApi, VaultEndpoint,
};
use crate::audit::enumerate_audit_devices;
use crate::cluster::scan_cluster_info;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::identity::IdentityGraphBuilder;
use crate::mfa::{collect_mfa, MfaConfig};
use crate::mounts::{enumerate_auth_mounts, enumerate_mounts};
use crate::policies::collect_policies;
use crate::resolver::PermissionResolver;
use crate::walk::{NamespaceWalker, SecretWalker};

const TOKEN_LOOKUP_PATH: &str = "auth/token/lookup-self";

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The token check before the scan failed
    #[error("Preflight check failed: {0}")]
    Preflight(ApiError),

    /// The caller cancelled the scan
    #[error("Scan cancelled")]
    Cancelled,
}

/// Result type for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Everything one scan found.
///
/// Records of all namespaces are flattened into single lists; each record
/// names its namespace. `namespaces` starts with the scan root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSnapshot {
    pub scan_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cluster: ClusterInfo,
    /// Audit devices of the scan root
    pub audit_devices: Vec<AuditDevice>,
    pub namespaces: Vec<Namespace>,
    pub mounts: Vec<Mount>,
    pub secrets: Vec<SecretNode>,
    pub policies: Vec<Policy>,
    pub auth_mounts: Vec<AuthMount>,
    pub principals: Vec<Principal>,
    pub permissions: Vec<EffectivePermission>,
    pub mfa_methods: Vec<MfaMethod>,
    pub mfa_enforcements: Vec<MfaEnforcement>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanSnapshot {
    /// Effective permissions of a principal in a namespace.
    pub fn permission(&self, namespace: &str, principal_id: &str) -> Option<&EffectivePermission> {
        self.permissions
            .iter()
            .find(|p| p.namespace == namespace && p.principal_id == principal_id)
    }

    /// Secret nodes below a mount of a namespace.
    pub fn secrets_of<'s>(&'s self, mount: &'s Mount) -> impl Iterator<Item = &'s SecretNode> + 's {
        self.secrets
            .iter()
            .filter(move |node| node.namespace == mount.namespace && node.mount == mount.path)
    }
}

/// Read-only scanner over one Vault deployment.
pub struct Scanner {
    /// API the scan reads through
    api: Arc<dyn VaultApi>,

    /// What to scan
    config: ScanConfig,

    /// Diagnostics of the most recent individual operation (`scan` uses its
    /// own)
    diagnostics: Diagnostics,
}

impl Scanner {
    /// Create a scanner over an API implementation.
    pub fn new(api: Arc<dyn VaultApi>, config: ScanConfig) -> ScanResult<Self> {
        config.validate()?;
        Ok(Self {
            api,
            config,
            diagnostics: Diagnostics::new(),
        })
    }

    /// Create a scanner talking HTTP to an endpoint.
    pub fn from_endpoint(endpoint: VaultEndpoint, config: ScanConfig) -> ScanResult<Self> {
        endpoint.validate()?;
        let client = HttpVaultClient::new(endpoint)?;
        Self::new(Arc::new(client), config)
    }

    /// Create a scanner from `VAULT_*` and `SCAN_*` environment variables.
    pub fn from_env() -> ScanResult<Self> {
        Self::from_endpoint(VaultEndpoint::from_env(), ScanConfig::from_env())
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Diagnostics recorded by the most recent individual operation.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// The configured scan root.
    pub fn root_namespace(&self) -> Namespace {
        Namespace::root(&self.config.root_namespace)
    }

    /// Check that the token is usable before scanning.
    pub async fn preflight(&self) -> ScanResult<()> {
        self.check_token(self.fresh_diagnostics()).await
    }

    /// The scan root followed by every discovered namespace.
    pub async fn scan_namespaces(&self) -> Vec<Namespace> {
        let walker = self.namespace_walker(self.fresh_diagnostics());
        let mut namespaces = vec![walker.root().clone()];
        namespaces.extend(walker.collect().await);
        namespaces
    }

    /// Secret engine mounts of a namespace.
    pub async fn scan_mounts(&self, namespace: &Namespace) -> Vec<Mount> {
        enumerate_mounts(self.api.as_ref(), self.fresh_diagnostics(), namespace).await
    }

    /// Folders and secrets below a mount.
    pub async fn scan_secrets(&self, mount: &Mount) -> Vec<SecretNode> {
        SecretWalker::new(
            self.api.as_ref(),
            self.fresh_diagnostics(),
            mount,
            self.config.max_traversal_depth,
        )
        .collect()
        .await
    }

    /// Policies of a namespace.
    pub async fn scan_policies(&self, namespace: &Namespace) -> Vec<Policy> {
        collect_policies(self.api.as_ref(), self.fresh_diagnostics(), namespace).await
    }

    /// Auth methods enabled in a namespace.
    pub async fn scan_auth_mounts(&self, namespace: &Namespace) -> Vec<AuthMount> {
        enumerate_auth_mounts(self.api.as_ref(), self.fresh_diagnostics(), namespace)
            .await
            .unwrap_or_default()
    }

    /// Principals of a namespace.
    pub async fn scan_principals(&self, namespace: &Namespace) -> Vec<Principal> {
        IdentityGraphBuilder::new(self.api.as_ref(), self.fresh_diagnostics())
            .build(namespace)
            .await
    }

    /// Effective permissions of every principal of a namespace.
    pub async fn resolve_permissions(&self, namespace: &Namespace) -> Vec<EffectivePermission> {
        let diagnostics = self.fresh_diagnostics();
        let api = self.api.as_ref();
        let principals = IdentityGraphBuilder::new(api, diagnostics).build(namespace).await;
        let policies = collect_policies(api, diagnostics, namespace).await;
        PermissionResolver::new(&principals, &policies, self.config.group_inheritance)
            .with_diagnostics(diagnostics.clone())
            .resolve_all(&principals)
    }

    /// Login MFA methods and enforcements of a namespace.
    pub async fn scan_mfa(&self, namespace: &Namespace) -> MfaConfig {
        collect_mfa(self.api.as_ref(), self.fresh_diagnostics(), namespace).await
    }

    /// Audit devices enabled in the scan root.
    pub async fn scan_audit_devices(&self) -> Vec<AuditDevice> {
        enumerate_audit_devices(self.api.as_ref(), self.fresh_diagnostics(), &self.root_namespace())
            .await
    }

    /// Version, seal and license facts.
    pub async fn scan_cluster_info(&self) -> ClusterInfo {
        scan_cluster_info(self.api.as_ref(), self.fresh_diagnostics()).await
    }

    /// Run a complete scan.
    ///
    /// `cancel` is checked between traversal steps.
    #[instrument(skip(self, cancel), fields(root = %self.root_namespace().context()))]
    pub async fn scan(&self, cancel: &CancellationToken) -> ScanResult<ScanSnapshot> {
        let scan_id = Uuid::now_v7();
        let started_at = Utc::now();
        let diagnostics = Diagnostics::new();
        let api = self.api.as_ref();
        info!(scan_id = %scan_id, "Starting scan");

        self.check_token(&diagnostics).await?;
        ensure_active(cancel)?;

        let cluster = scan_cluster_info(api, &diagnostics).await;
        let audit_devices = enumerate_audit_devices(api, &diagnostics, &self.root_namespace()).await;
        let namespaces = self.discover_namespaces(&diagnostics, cancel).await?;

        let mut mounts = Vec::new();
        let mut secrets = Vec::new();
        let mut policies = Vec::new();
        let mut auth_mounts = Vec::new();
        let mut principals = Vec::new();
        let mut permissions = Vec::new();
        let mut mfa_methods = Vec::new();
        let mut mfa_enforcements = Vec::new();

        for namespace in &namespaces {
            ensure_active(cancel)?;
            let namespace_mounts = enumerate_mounts(api, &diagnostics, namespace).await;
            for mount in &namespace_mounts {
                let mut walker =
                    SecretWalker::new(api, &diagnostics, mount, self.config.max_traversal_depth);
                loop {
                    ensure_active(cancel)?;
                    match walker.next().await {
                        Some(node) => secrets.push(node),
                        None => break,
                    }
                }
            }
            mounts.extend(namespace_mounts);

            ensure_active(cancel)?;
            let namespace_policies = collect_policies(api, &diagnostics, namespace).await;
            ensure_active(cancel)?;
            let namespace_auth = enumerate_auth_mounts(api, &diagnostics, namespace).await;
            let namespace_principals = IdentityGraphBuilder::new(api, &diagnostics)
                .build_from(namespace, namespace_auth.as_deref())
                .await;

            permissions.extend(
                PermissionResolver::new(
                    &namespace_principals,
                    &namespace_policies,
                    self.config.group_inheritance,
                )
                .with_diagnostics(diagnostics.clone())
                .resolve_all(&namespace_principals),
            );
            policies.extend(namespace_policies);
            principals.extend(namespace_principals);
            auth_mounts.extend(namespace_auth.unwrap_or_default());

            ensure_active(cancel)?;
            let mfa = collect_mfa(api, &diagnostics, namespace).await;
            mfa_methods.extend(mfa.methods);
            mfa_enforcements.extend(mfa.enforcements);
        }

        let snapshot = ScanSnapshot {
            scan_id,
            started_at,
            finished_at: Utc::now(),
            cluster,
            audit_devices,
            namespaces,
            mounts,
            secrets,
            policies,
            auth_mounts,
            principals,
            permissions,
            mfa_methods,
            mfa_enforcements,
            diagnostics: diagnostics.take(),
        };

        info!(
            scan_id = %scan_id,
            namespaces = snapshot.namespaces.len(),
            mounts = snapshot.mounts.len(),
            secrets = snapshot.secrets.len(),
            principals = snapshot.principals.len(),
            diagnostics = snapshot.diagnostics.len(),
            "Scan complete"
        );
        Ok(snapshot)
    }

    /// The operation channel, emptied.
    fn fresh_diagnostics(&self) -> &Diagnostics {
        self.diagnostics.clear();
        &self.diagnostics
    }

    fn namespace_walker<'a>(&'a self, diagnostics: &'a Diagnostics) -> NamespaceWalker<'a> {
        NamespaceWalker::new(
            self.api.as_ref(),
            diagnostics,
            self.root_namespace(),
            self.config.follow_child_namespaces,
            self.config.max_traversal_depth,
        )
    }

    async fn discover_namespaces(
        &self,
        diagnostics: &Diagnostics,
        cancel: &CancellationToken,
    ) -> ScanResult<Vec<Namespace>> {
        let mut walker = self.namespace_walker(diagnostics);
        let mut namespaces = vec![walker.root().clone()];
        loop {
            ensure_active(cancel)?;
            match walker.next().await {
                Some(namespace) => namespaces.push(namespace),
                None => return Ok(namespaces),
            }
        }
    }

    async fn check_token(&self, diagnostics: &Diagnostics) -> ScanResult<()> {
        let context = self.root_namespace().context();
        match self.api.get(TOKEN_LOOKUP_PATH, &context).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                warn!(namespace = %context, "Token lookup endpoint not found, continuing");
                Ok(())
            }
            Err(
                err @ (ApiError::Unauthorized { .. }
                | ApiError::PermissionDenied { .. }
                | ApiError::Transport { .. }),
            ) => {
                error!(namespace = %context, error = %err, "Token rejected");
                Err(ScanError::Preflight(err))
            }
            Err(err) => {
                diagnostics.record_error(&err, &context);
                Ok(())
            }
        }
    }
}

fn ensure_active(cancel: &CancellationToken) -> ScanResult<()> {
    if cancel.is_cancelled() {
        Err(ScanError::Cancelled)
    } else {
        Ok(())
    }
}
