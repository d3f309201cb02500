//! Audit device enumeration.

use tracing::{debug, instrument};
use vault_model::{AuditDevice, Namespace};

use crate::client::VaultApi;
use crate::diagnostics::Diagnostics;
use crate::mounts::{decode_entries, read_table};

const AUDIT_PATH: &str = "sys/audit";

/// List the audit devices enabled in a namespace, sorted by path.
///
/// Audit devices are configured in the top-level namespace; other
/// namespaces usually report the endpoint as unavailable.
#[instrument(skip(api, diagnostics, namespace), fields(namespace = %namespace.context()))]
pub async fn enumerate_audit_devices(
    api: &dyn VaultApi,
    diagnostics: &Diagnostics,
    namespace: &Namespace,
) -> Vec<AuditDevice> {
    let context = namespace.context();
    let Some(entries) = read_table(api, diagnostics, &context, AUDIT_PATH).await else {
        return Vec::new();
    };

    let mut devices: Vec<AuditDevice> = decode_entries(diagnostics, &context, AUDIT_PATH, entries)
        .into_iter()
        .map(|(path, document)| AuditDevice {
            path: vault_model::namespace::normalize_path(&path),
            options: document.string_options(),
            device_type: document.engine_type,
            namespace: namespace.path.clone(),
            description: document.description,
            local: document.local,
        })
        .collect();

    devices.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(count = devices.len(), "Enumerated audit devices");
    devices
}
