//! Cluster information.

use tracing::{debug, instrument};
use vault_model::{ClusterInfo, NamespaceContext};

use crate::client::documents::{HealthDocument, LicenseStatusDocument};
use crate::client::{decode_document, fetch_document, VaultApi};
use crate::diagnostics::Diagnostics;

pub const HEALTH_PATH: &str = "sys/health";

/// Map every server state to 200, so sealed, standby and uninitialized
/// servers still report their details.
pub const HEALTH_QUERY: &[(&str, &str)] = &[
    ("standbyok", "true"),
    ("perfstandbyok", "true"),
    ("sealedcode", "200"),
    ("uninitcode", "200"),
];
pub const LICENSE_PATH: &str = "sys/license/status";

/// Gather what the token can see about the cluster. Never fails.
#[instrument(skip(api, diagnostics))]
pub async fn scan_cluster_info(api: &dyn VaultApi, diagnostics: &Diagnostics) -> ClusterInfo {
    let context = NamespaceContext::root();
    let mut info = ClusterInfo::default();

    let health = api
        .get_with_query(HEALTH_PATH, HEALTH_QUERY, &context)
        .await
        .and_then(|body| decode_document::<HealthDocument>(HEALTH_PATH, body));
    match health {
        Ok(Some(health)) => {
            info.version = health.version;
            info.cluster_name = health.cluster_name;
            info.cluster_id = health.cluster_id;
            info.initialized = health.initialized;
            info.sealed = health.sealed;
            info.standby = health.standby;
        }
        Ok(None) => {}
        Err(err) => diagnostics.record_error(&err, &context),
    }

    // Absent on OSS builds.
    match fetch_document::<LicenseStatusDocument, _>(api, LICENSE_PATH, &context).await {
        Ok(Some(status)) => info.license = status.into_license(),
        Ok(None) => {}
        Err(err) => diagnostics.record_error(&err, &context),
    }

    debug!(
        version = info.version.as_deref().unwrap_or("unknown"),
        enterprise = info.is_enterprise(),
        "Read cluster information"
    );
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeVault;
    use crate::client::ApiError;
    use crate::diagnostics::DiagnosticKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_enterprise_cluster() {
        let api = FakeVault::new()
            .with_document(
                "",
                HEALTH_PATH,
                json!({
                    "initialized": true,
                    "sealed": false,
                    "standby": false,
                    "version": "1.15.2+ent",
                    "cluster_name": "vault-cluster-1",
                    "cluster_id": "c-1"
                }),
            )
            .with_document(
                "",
                LICENSE_PATH,
                json!({"data": {"autoloaded": {
                    "license_id": "lic-1",
                    "expiration_time": "2030-01-01T00:00:00Z",
                    "features": ["Namespaces", "Sentinel"]
                }}}),
            );
        let diagnostics = Diagnostics::new();

        let info = scan_cluster_info(&api, &diagnostics).await;
        assert_eq!(info.version.as_deref(), Some("1.15.2+ent"));
        assert_eq!(info.cluster_name.as_deref(), Some("vault-cluster-1"));
        assert_eq!(info.sealed, Some(false));
        let license = info.license.as_ref().unwrap();
        assert_eq!(license.license_id.as_deref(), Some("lic-1"));
        assert_eq!(license.features.len(), 2);
        assert!(info.is_enterprise());
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_oss_cluster() {
        let api = FakeVault::new()
            .with_document("", HEALTH_PATH, json!({"initialized": true, "sealed": false, "version": "1.15.2"}))
            .with_error(
                "",
                LICENSE_PATH,
                ApiError::FeatureUnavailable {
                    path: LICENSE_PATH.into(),
                    message: "unsupported path".into(),
                },
            );
        let diagnostics = Diagnostics::new();

        let info = scan_cluster_info(&api, &diagnostics).await;
        assert_eq!(info.version.as_deref(), Some("1.15.2"));
        assert!(info.license.is_none());
        assert!(!info.is_enterprise());
        assert_eq!(diagnostics.count(DiagnosticKind::FeatureUnavailable), 1);
    }
}
