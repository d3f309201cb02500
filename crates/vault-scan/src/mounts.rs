//! Secret engine and auth method mount enumeration.
//!
//! `sys/mounts`, `sys/auth` and `sys/audit` share one shape: a map from mount
//! path to an entry. Entries are decoded one by one so a single bad entry
//! only costs itself.

use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument};
use vault_model::{AuthMount, EngineType, Mount, Namespace, NamespaceContext};

use crate::client::documents::MountDocument;
use crate::client::{fetch_document, VaultApi};
use crate::diagnostics::{DiagnosticKind, Diagnostics};

const MOUNTS_PATH: &str = "sys/mounts";
const AUTH_PATH: &str = "sys/auth";

/// List the secret engine mounts of a namespace, sorted by path.
///
/// Mounts under `sys/` and engine types outside the [`EngineType`] allow-list
/// are left out. A failed read yields no mounts and a diagnostic; an entry
/// that cannot be decoded is skipped with a `Malformed` diagnostic.
#[instrument(skip(api, diagnostics, namespace), fields(namespace = %namespace.context()))]
pub async fn enumerate_mounts(
    api: &dyn VaultApi,
    diagnostics: &Diagnostics,
    namespace: &Namespace,
) -> Vec<Mount> {
    let context = namespace.context();
    let Some(entries) = read_table(api, diagnostics, &context, MOUNTS_PATH).await else {
        return Vec::new();
    };

    let mut mounts: Vec<Mount> = decode_entries(diagnostics, &context, MOUNTS_PATH, entries)
        .into_iter()
        .filter(|(path, _)| !path.starts_with("sys/"))
        .filter_map(|(path, document)| {
            let (engine_type, version) =
                EngineType::classify(&document.engine_type, document.options_version().as_deref())?;

            let mut mount = Mount::new(&path, engine_type, namespace.path.clone())
                .with_version(version)
                .with_description(document.description);
            mount.accessor = Some(document.accessor).filter(|a| !a.is_empty());
            mount.local = document.local;
            mount.seal_wrap = document.seal_wrap;
            mount.running_version = Some(document.running_plugin_version).filter(|v| !v.is_empty());
            Some(mount)
        })
        .collect();

    mounts.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(count = mounts.len(), "Enumerated secret mounts");
    mounts
}

/// List the auth methods enabled in a namespace, sorted by path.
///
/// `None` when `sys/auth` could not be read; the failure is recorded.
#[instrument(skip(api, diagnostics, namespace), fields(namespace = %namespace.context()))]
pub async fn enumerate_auth_mounts(
    api: &dyn VaultApi,
    diagnostics: &Diagnostics,
    namespace: &Namespace,
) -> Option<Vec<AuthMount>> {
    let context = namespace.context();
    let entries = read_table(api, diagnostics, &context, AUTH_PATH).await?;

    let mut mounts: Vec<AuthMount> = decode_entries(diagnostics, &context, AUTH_PATH, entries)
        .into_iter()
        .map(|(path, document)| {
            let mut mount = AuthMount::new(&path, document.engine_type, namespace.path.clone())
                .with_accessor(document.accessor)
                .with_description(document.description);
            mount.local = document.local;
            mount.seal_wrap = document.seal_wrap;
            mount
        })
        .collect();

    mounts.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(count = mounts.len(), "Enumerated auth methods");
    Some(mounts)
}

/// Read a `sys/` mount table. `None` when absent or unreadable.
pub(crate) async fn read_table(
    api: &dyn VaultApi,
    diagnostics: &Diagnostics,
    context: &NamespaceContext,
    source: &str,
) -> Option<HashMap<String, Value>> {
    match fetch_document::<HashMap<String, Value>, _>(api, source, context).await {
        Ok(entries) => entries,
        Err(err) => {
            diagnostics.record_error(&err, context);
            None
        }
    }
}

/// Decode the entries of a mount table.
///
/// Older servers repeat every entry at the top level next to request
/// metadata, so non-object values are ignored.
pub(crate) fn decode_entries(
    diagnostics: &Diagnostics,
    context: &NamespaceContext,
    source: &str,
    entries: HashMap<String, Value>,
) -> Vec<(String, MountDocument)> {
    entries
        .into_iter()
        .filter(|(_, value)| value.is_object())
        .filter_map(|(path, value)| match serde_json::from_value(value) {
            Ok(document) => Some((path, document)),
            Err(err) => {
                diagnostics.record(
                    DiagnosticKind::Malformed,
                    context,
                    format!("{}/{}", source, path),
                    format!("mount entry could not be decoded: {}", err),
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeVault;
    use crate::client::ApiError;
    use crate::diagnostics::DiagnosticKind;
    use serde_json::json;

    fn mounts_body() -> Value {
        json!({
            "request_id": "7f3c",
            "data": {
                "secret/": {"type": "kv", "description": "v1 store", "accessor": "kv_1", "options": {"version": "1"}},
                "kv/": {"type": "kv", "options": {"version": "2"}, "local": true, "seal_wrap": true, "running_plugin_version": "v0.16.1+builtin"},
                "legacy/": {"type": "kv", "options": null},
                "kv2/": {"type": "kv-v2"},
                "pki/": {"type": "pki"},
                "cubbyhole/": {"type": "cubbyhole"},
                "sys/": {"type": "system"},
                "sys/custom/": {"type": "kv"},
                "identity/": {"type": "identity"},
                "ssh/": {"type": "ssh"}
            }
        })
    }

    #[tokio::test]
    async fn test_allow_list_and_ordering() {
        let api = FakeVault::new().with_document("", "sys/mounts", mounts_body());
        let diagnostics = Diagnostics::new();

        let mounts = enumerate_mounts(&api, &diagnostics, &Namespace::root("")).await;
        let paths: Vec<&str> = mounts.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["cubbyhole/", "kv/", "kv2/", "legacy/", "pki/", "secret/"]);

        let kv = &mounts[1];
        assert_eq!(kv.engine_version.as_deref(), Some("2"));
        assert!(kv.local);
        assert!(kv.seal_wrap);
        assert_eq!(kv.running_version.as_deref(), Some("v0.16.1+builtin"));

        assert_eq!(mounts[2].engine_version.as_deref(), Some("2"));
        assert_eq!(mounts[3].engine_version.as_deref(), Some("1"));
        assert_eq!(mounts[4].engine_version, None);

        let secret = &mounts[5];
        assert_eq!(secret.description, "v1 store");
        assert_eq!(secret.accessor.as_deref(), Some("kv_1"));
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_mounts_carry_namespace() {
        let api = FakeVault::new().with_document(
            "team/",
            "sys/mounts",
            json!({"data": {"kv/": {"type": "kv", "options": {"version": "2"}}}}),
        );
        let diagnostics = Diagnostics::new();
        let root = Namespace::root("");
        let team = Namespace::child(&root, "team/", None, Default::default());

        let mounts = enumerate_mounts(&api, &diagnostics, &team).await;
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].namespace, "team/");
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_recorded() {
        let api = FakeVault::new().with_document(
            "",
            "sys/mounts",
            json!({"data": {
                "secret/": {"type": "kv", "options": {"version": "1"}},
                "broken/": {"type": "kv", "accessor": 12}
            }}),
        );
        let diagnostics = Diagnostics::new();

        let mounts = enumerate_mounts(&api, &diagnostics, &Namespace::root("")).await;
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].path, "secret/");

        let entries = diagnostics.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, DiagnosticKind::Malformed);
        assert_eq!(entries[0].path, "sys/mounts/broken/");
    }

    #[tokio::test]
    async fn test_auth_mounts_at_custom_paths() {
        let api = FakeVault::new().with_document(
            "team/",
            "sys/auth",
            json!({"data": {
                "token/": {"type": "token", "accessor": "auth_token_1"},
                "corp-users/": {"type": "userpass", "accessor": "auth_userpass_9", "description": "staff"},
                "ci/approle/": {"type": "approle", "local": true}
            }}),
        );
        let diagnostics = Diagnostics::new();
        let root = Namespace::root("");
        let team = Namespace::child(&root, "team/", None, Default::default());

        let mounts = enumerate_auth_mounts(&api, &diagnostics, &team).await.unwrap();
        let paths: Vec<&str> = mounts.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["ci/approle/", "corp-users/", "token/"]);
        assert!(mounts[0].local);
        assert_eq!(mounts[1].accessor.as_deref(), Some("auth_userpass_9"));
        assert_eq!(mounts[1].namespace, "team/");
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_auth_table_is_none() {
        let api = FakeVault::new().with_error(
            "",
            "sys/auth",
            ApiError::PermissionDenied {
                path: "sys/auth".into(),
            },
        );
        let diagnostics = Diagnostics::new();

        assert!(enumerate_auth_mounts(&api, &diagnostics, &Namespace::root("")).await.is_none());
        assert_eq!(diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_recorded() {
        let api = FakeVault::new().with_error(
            "",
            "sys/mounts",
            ApiError::PermissionDenied {
                path: "sys/mounts".into(),
            },
        );
        let diagnostics = Diagnostics::new();

        let mounts = enumerate_mounts(&api, &diagnostics, &Namespace::root("")).await;
        assert!(mounts.is_empty());
        assert_eq!(diagnostics.count(DiagnosticKind::FeatureUnavailable), 1);
    }
}
