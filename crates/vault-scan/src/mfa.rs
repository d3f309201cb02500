//! Login MFA configuration.
//!
//! ```text
//! identity/mfa/method                → MfaMethod
//! identity/mfa/login-enforcement     → MfaEnforcement
//! ```

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use vault_model::{MfaEnforcement, MfaMethod, Namespace, NamespaceContext};

use crate::client::documents::{MfaEnforcementDocument, MfaMethodDocument};
use crate::client::{fetch_document, VaultApi};
use crate::diagnostics::{DiagnosticKind, Diagnostics};

const METHODS_PATH: &str = "identity/mfa/method";
const ENFORCEMENTS_PATH: &str = "identity/mfa/login-enforcement";

/// MFA methods and login enforcements of one namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MfaConfig {
    pub methods: Vec<MfaMethod>,
    pub enforcements: Vec<MfaEnforcement>,
}

/// Read the login MFA configuration of a namespace.
///
/// Methods and enforcements are read independently; each list is sorted by
/// id.
#[instrument(skip(api, diagnostics, namespace), fields(namespace = %namespace.context()))]
pub async fn collect_mfa(
    api: &dyn VaultApi,
    diagnostics: &Diagnostics,
    namespace: &Namespace,
) -> MfaConfig {
    let context = namespace.context();

    let mut methods = Vec::new();
    for id in list(api, diagnostics, &context, METHODS_PATH).await {
        let path = format!("{}/{}", METHODS_PATH, id);
        let Some(document) = read::<MfaMethodDocument>(api, diagnostics, &context, &path).await else {
            continue;
        };
        let id = if document.id.is_empty() { id } else { document.id };
        methods.push(MfaMethod {
            name: if document.name.is_empty() { id.clone() } else { document.name },
            id,
            method_type: document.method_type,
            namespace: namespace.path.clone(),
            mount_accessor: Some(document.mount_accessor).filter(|a| !a.is_empty()),
        });
    }

    let mut enforcements = Vec::new();
    for name in list(api, diagnostics, &context, ENFORCEMENTS_PATH).await {
        let path = format!("{}/{}", ENFORCEMENTS_PATH, name);
        let Some(document) = read::<MfaEnforcementDocument>(api, diagnostics, &context, &path).await
        else {
            continue;
        };
        enforcements.push(MfaEnforcement {
            id: if document.id.is_empty() { name.clone() } else { document.id },
            name,
            namespace: namespace.path.clone(),
            mfa_method_ids: document.mfa_method_ids,
            auth_method_accessors: document.auth_method_accessors,
            auth_method_types: document.auth_method_types,
            identity_group_ids: document.identity_group_ids,
            identity_entity_ids: document.identity_entity_ids,
        });
    }

    methods.sort_by(|a, b| a.id.cmp(&b.id));
    enforcements.sort_by(|a, b| a.id.cmp(&b.id));
    debug!(
        methods = methods.len(),
        enforcements = enforcements.len(),
        "Read MFA configuration"
    );
    MfaConfig {
        methods,
        enforcements,
    }
}

async fn list(
    api: &dyn VaultApi,
    diagnostics: &Diagnostics,
    context: &NamespaceContext,
    path: &str,
) -> Vec<String> {
    match api.list(path, context).await {
        Ok(keys) => keys
            .into_iter()
            .map(|key| key.trim_end_matches('/').to_string())
            .filter(|key| !key.is_empty())
            .collect(),
        Err(err) => {
            diagnostics.record_error(&err, context);
            Vec::new()
        }
    }
}

async fn read<T: DeserializeOwned>(
    api: &dyn VaultApi,
    diagnostics: &Diagnostics,
    context: &NamespaceContext,
    path: &str,
) -> Option<T> {
    match fetch_document::<T, _>(api, path, context).await {
        Ok(Some(document)) => Some(document),
        Ok(None) => {
            diagnostics.record(DiagnosticKind::NotFound, context, path, "listed but not readable");
            None
        }
        Err(err) => {
            diagnostics.record_error(&err, context);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeVault;
    use crate::client::ApiError;
    use serde_json::json;

    #[tokio::test]
    async fn test_methods_and_enforcements() {
        let api = FakeVault::new()
            .with_list("", "identity/mfa/method", &["m-2", "m-1"])
            .with_document(
                "",
                "identity/mfa/method/m-1",
                json!({"data": {"id": "m-1", "name": "", "type": "totp", "mount_accessor": null}}),
            )
            .with_document(
                "",
                "identity/mfa/method/m-2",
                json!({"data": {"id": "m-2", "name": "duo-prod", "type": "duo", "secret_key": "redacted"}}),
            )
            .with_list("", "identity/mfa/login-enforcement", &["admins"])
            .with_document(
                "",
                "identity/mfa/login-enforcement/admins",
                json!({"data": {
                    "id": "enf-1",
                    "name": "admins",
                    "mfa_method_ids": ["m-1"],
                    "auth_method_accessors": ["auth_userpass_1"],
                    "auth_method_types": null,
                    "identity_group_ids": ["g-admins"]
                }}),
            );
        let diagnostics = Diagnostics::new();

        let config = collect_mfa(&api, &diagnostics, &Namespace::root("")).await;

        assert_eq!(config.methods.len(), 2);
        assert_eq!(config.methods[0].id, "m-1");
        assert_eq!(config.methods[0].name, "m-1");
        assert_eq!(config.methods[0].mount_accessor, None);
        assert_eq!(config.methods[1].method_type, "duo");

        let enforcement = &config.enforcements[0];
        assert_eq!(enforcement.id, "enf-1");
        assert_eq!(enforcement.mfa_method_ids, vec!["m-1"]);
        assert!(enforcement.auth_method_types.is_empty());
        assert!(enforcement.covers_entity("e-7", &["g-admins".to_string()]));
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_server_is_recorded() {
        let unsupported = |path: &str| ApiError::FeatureUnavailable {
            path: path.into(),
            message: "unsupported path".into(),
        };
        let api = FakeVault::new()
            .with_error("", "identity/mfa/method", unsupported("identity/mfa/method"))
            .with_error(
                "",
                "identity/mfa/login-enforcement",
                unsupported("identity/mfa/login-enforcement"),
            );
        let diagnostics = Diagnostics::new();

        let config = collect_mfa(&api, &diagnostics, &Namespace::root("")).await;
        assert_eq!(config, MfaConfig::default());
        assert_eq!(diagnostics.count(DiagnosticKind::FeatureUnavailable), 2);
    }
}
