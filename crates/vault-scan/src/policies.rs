//! Policy collection.

use tracing::{debug, instrument};
use vault_model::{Namespace, Policy};
use vault_policy::PolicyKind;

use crate::client::documents::PolicyDocument;
use crate::client::{fetch_document, VaultApi};
use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Read every policy of a namespace, sorted by kind then name.
///
/// Governing policies are an Enterprise feature; on other servers their
/// listings fail with a diagnostic and the ACL policies are still returned.
#[instrument(skip(api, diagnostics, namespace), fields(namespace = %namespace.context()))]
pub async fn collect_policies(
    api: &dyn VaultApi,
    diagnostics: &Diagnostics,
    namespace: &Namespace,
) -> Vec<Policy> {
    let mut policies = Vec::new();
    for kind in PolicyKind::all() {
        policies.extend(collect_kind(api, diagnostics, namespace, kind).await);
    }

    policies.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    policies
}

async fn collect_kind(
    api: &dyn VaultApi,
    diagnostics: &Diagnostics,
    namespace: &Namespace,
    kind: PolicyKind,
) -> Vec<Policy> {
    let context = namespace.context();
    let names = match api.list(kind.sys_path(), &context).await {
        Ok(names) => names,
        Err(err) => {
            diagnostics.record_error(&err, &context);
            return Vec::new();
        }
    };
    debug!(kind = kind.as_str(), count = names.len(), "Listed policies");

    let mut policies = Vec::with_capacity(names.len());
    for name in names {
        let path = format!("{}/{}", kind.sys_path(), name);
        match fetch_document::<PolicyDocument, _>(api, &path, &context).await {
            Ok(Some(document)) => {
                let name = if document.name.is_empty() { name } else { document.name };
                let level = Some(document.enforcement_level);
                policies.push(
                    Policy::new(name, kind, document.policy, namespace.path.clone())
                        .with_enforcement_level(level),
                );
            }
            Ok(None) => diagnostics.record(
                DiagnosticKind::NotFound,
                &context,
                path,
                "policy listed but not readable",
            ),
            Err(err) => diagnostics.record_error(&err, &context),
        }
    }
    policies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeVault;
    use crate::client::ApiError;
    use serde_json::json;

    fn unsupported(path: &str) -> ApiError {
        ApiError::FeatureUnavailable {
            path: path.to_string(),
            message: "unsupported path".to_string(),
        }
    }

    #[tokio::test]
    async fn test_acl_policies_on_oss() {
        let api = FakeVault::new()
            .with_list("", "sys/policies/acl", &["root", "default"])
            .with_document(
                "",
                "sys/policies/acl/default",
                json!({"data": {"name": "default", "policy": "path \"secret/*\" { capabilities = [\"read\"] }"}}),
            )
            .with_document("", "sys/policies/acl/root", json!({"data": {"name": "root", "policy": ""}}))
            .with_error("", "sys/policies/rgp", unsupported("sys/policies/rgp"))
            .with_error("", "sys/policies/egp", unsupported("sys/policies/egp"));
        let diagnostics = Diagnostics::new();

        let policies = collect_policies(&api, &diagnostics, &Namespace::root("")).await;
        let names: Vec<&str> = policies.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["default", "root"]);
        assert_eq!(policies[0].rules.len(), 1);
        assert_eq!(policies[0].rules[0].path, "secret/*");
        assert!(policies[1].rules.is_empty());
        assert_eq!(diagnostics.count(DiagnosticKind::FeatureUnavailable), 2);
    }

    #[tokio::test]
    async fn test_governing_policies_keep_enforcement_level() {
        let api = FakeVault::new()
            .with_list("ns1/", "sys/policies/egp", &["business-hours"])
            .with_document(
                "ns1/",
                "sys/policies/egp/business-hours",
                json!({"data": {
                    "name": "business-hours",
                    "policy": "main = rule { true }",
                    "enforcement_level": "soft-mandatory",
                    "paths": ["*"]
                }}),
            );
        let diagnostics = Diagnostics::new();
        let namespace = Namespace::root("ns1");

        let policies = collect_policies(&api, &diagnostics, &namespace).await;
        assert_eq!(policies.len(), 1);
        let policy = &policies[0];
        assert_eq!(policy.kind, PolicyKind::EndpointGoverning);
        assert_eq!(policy.enforcement_level.as_deref(), Some("soft-mandatory"));
        assert_eq!(policy.namespace, "ns1/");
        assert!(policy.rules.is_empty());
    }

    #[tokio::test]
    async fn test_missing_policy_document() {
        let api = FakeVault::new().with_list("", "sys/policies/acl", &["gone"]);
        let diagnostics = Diagnostics::new();

        let policies = collect_policies(&api, &diagnostics, &Namespace::root("")).await;
        assert!(policies.is_empty());
        assert_eq!(diagnostics.count(DiagnosticKind::NotFound), 1);
    }
}
