//! Typed response documents.
//!
//! Vault omits fields freely and reports empty collections as `null`, so
//! every field is optional and decodes to its default when absent or null.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use vault_model::{parse_timestamp, EntityAlias, LicenseInfo, VersionMetadata};

/// `sys/namespaces/{name}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamespaceDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_metadata: HashMap<String, Value>,
}

/// One entry of `sys/mounts`, `sys/auth` or `sys/audit`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MountDocument {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub engine_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub accessor: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub local: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seal_wrap: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: HashMap<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub running_plugin_version: String,
}

impl MountDocument {
    /// `options.version`, as a string whether Vault sent a string or a number.
    pub fn options_version(&self) -> Option<String> {
        match self.options.get("version") {
            Some(Value::String(version)) => Some(version.clone()),
            Some(Value::Number(version)) => Some(version.to_string()),
            _ => None,
        }
    }

    /// Options as strings; nulls are dropped.
    pub fn string_options(&self) -> BTreeMap<String, String> {
        self.options
            .iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key.clone(), s.clone())),
                other => Some((key.clone(), other.to_string())),
            })
            .collect()
    }
}

/// `<mount>metadata/<path>` of a KV v2 mount.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretMetadataDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_version: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub versions: HashMap<String, SecretVersionDocument>,
}

/// One entry of a KV v2 metadata `versions` map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretVersionDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deletion_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub destroyed: bool,
}

impl SecretMetadataDocument {
    /// Version metadata of the current version.
    pub fn into_version_metadata(self) -> VersionMetadata {
        let current = self.versions.get(&self.current_version.to_string());

        VersionMetadata {
            version: self.current_version,
            created_time: parse_timestamp(&self.created_time),
            updated_time: parse_timestamp(&self.updated_time),
            deletion_time: current.and_then(|v| parse_timestamp(&v.deletion_time)),
            destroyed: current.map(|v| v.destroyed).unwrap_or(false),
        }
    }
}

/// `auth/userpass/users/{name}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDocument {
    #[serde(default, deserialize_with = "string_or_list")]
    pub policies: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub token_policies: Vec<String>,
    #[serde(flatten)]
    pub attributes: HashMap<String, Value>,
}

impl UserDocument {
    /// Scalar attributes other than policies, rendered as strings.
    pub fn metadata(&self) -> HashMap<String, String> {
        self.attributes
            .iter()
            .filter_map(|(key, value)| {
                let rendered = match value {
                    Value::String(s) if !s.is_empty() => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((key.clone(), rendered))
            })
            .collect()
    }
}

/// `identity/entity/id/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_list")]
    pub policies: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aliases: Vec<EntityAlias>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disabled: bool,
}

/// `identity/group/id/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_list")]
    pub policies: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub member_entity_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub member_group_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parent_group_ids: Vec<String>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub group_type: String,
}

/// `auth/<mount>role/{name}` of AppRole, Kubernetes and AWS mounts
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleDocument {
    #[serde(default, deserialize_with = "string_or_list")]
    pub policies: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub token_policies: Vec<String>,
    #[serde(default, deserialize_with = "seconds")]
    pub token_ttl: Option<u64>,
    #[serde(default, deserialize_with = "seconds")]
    pub token_max_ttl: Option<u64>,
}

/// `sys/policies/{acl,rgp,egp}/{name}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub policy: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enforcement_level: String,
}

/// `identity/mfa/method/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MfaMethodDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub method_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mount_accessor: String,
}

/// `identity/mfa/login-enforcement/{name}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MfaEnforcementDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mfa_method_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub auth_method_accessors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub auth_method_types: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub identity_group_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub identity_entity_ids: Vec<String>,
}

/// `sys/health`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthDocument {
    pub version: Option<String>,
    pub cluster_name: Option<String>,
    pub cluster_id: Option<String>,
    pub initialized: Option<bool>,
    pub sealed: Option<bool>,
    pub standby: Option<bool>,
}

/// `sys/license/status`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LicenseStatusDocument {
    pub autoloaded: Option<LicenseDocument>,
    #[serde(flatten)]
    pub stored: LicenseDocument,
}

/// License details, as nested under `autoloaded` or inline on older servers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LicenseDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub license_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expiration_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<String>,
}

impl LicenseStatusDocument {
    /// The active license, if any.
    pub fn into_license(self) -> Option<LicenseInfo> {
        let license = self
            .autoloaded
            .filter(|l| !l.license_id.is_empty())
            .or(Some(self.stored))
            .filter(|l| !l.license_id.is_empty())?;

        Some(LicenseInfo {
            license_id: Some(license.license_id),
            expiration_time: parse_timestamp(&license.expiration_time),
            features: license.features,
        })
    }
}

/// Decode `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a policy list given as an array, a comma separated string or null.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items: Vec<String> = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a policy list, got {}",
                other
            )))
        }
    };

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Decode a duration in seconds given as a number or a numeric string.
fn seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nulls_decode_to_defaults() {
        let group: GroupDocument = serde_json::from_value(json!({
            "id": "g-1",
            "name": null,
            "policies": null,
            "member_entity_ids": null,
            "parent_group_ids": ["g-0"],
            "type": "internal"
        }))
        .unwrap();

        assert_eq!(group.id, "g-1");
        assert_eq!(group.name, "");
        assert!(group.policies.is_empty());
        assert!(group.member_entity_ids.is_empty());
        assert_eq!(group.parent_group_ids, vec!["g-0"]);
        assert_eq!(group.group_type, "internal");
    }

    #[test]
    fn test_policies_from_string_or_list() {
        let user: UserDocument = serde_json::from_value(json!({
            "policies": "default, dev,",
            "token_policies": ["ops", ""],
            "token_type": "default",
            "token_ttl": 3600,
            "token_bound_cidrs": []
        }))
        .unwrap();

        assert_eq!(user.policies, vec!["default", "dev"]);
        assert_eq!(user.token_policies, vec!["ops"]);

        let metadata = user.metadata();
        assert_eq!(metadata.get("token_type").map(String::as_str), Some("default"));
        assert_eq!(metadata.get("token_ttl").map(String::as_str), Some("3600"));
        assert!(!metadata.contains_key("token_bound_cidrs"));
        assert!(!metadata.contains_key("policies"));
    }

    #[test]
    fn test_role_ttls() {
        let role: RoleDocument = serde_json::from_value(json!({
            "token_policies": ["ci"],
            "token_ttl": "600",
            "token_max_ttl": 1200
        }))
        .unwrap();
        assert_eq!(role.token_ttl, Some(600));
        assert_eq!(role.token_max_ttl, Some(1200));
        assert!(role.policies.is_empty());
    }

    #[test]
    fn test_secret_metadata_uses_current_version() {
        let document: SecretMetadataDocument = serde_json::from_value(json!({
            "current_version": 2,
            "created_time": "2024-01-01T00:00:00Z",
            "updated_time": "2024-02-01T00:00:00Z",
            "versions": {
                "1": {"created_time": "2024-01-01T00:00:00Z", "deletion_time": "", "destroyed": true},
                "2": {"created_time": "2024-02-01T00:00:00Z", "deletion_time": "2024-03-01T00:00:00Z", "destroyed": false}
            }
        }))
        .unwrap();

        let metadata = document.into_version_metadata();
        assert_eq!(metadata.version, 2);
        assert!(metadata.created_time.is_some());
        assert!(metadata.updated_time.is_some());
        assert!(metadata.deletion_time.is_some());
        assert!(!metadata.destroyed);
    }

    #[test]
    fn test_string_options() {
        let document: MountDocument = serde_json::from_value(json!({
            "type": "file",
            "options": {"file_path": "/var/log/vault_audit.log", "hmac_accessor": false, "prefix": null}
        }))
        .unwrap();

        let options = document.string_options();
        assert_eq!(options.len(), 2);
        assert_eq!(options["file_path"], "/var/log/vault_audit.log");
        assert_eq!(options["hmac_accessor"], "false");
    }

    #[test]
    fn test_mount_options_version() {
        let mount: MountDocument = serde_json::from_value(json!({
            "type": "kv",
            "options": {"version": "2"},
            "accessor": "kv_1234"
        }))
        .unwrap();
        assert_eq!(mount.options_version().as_deref(), Some("2"));

        let no_options: MountDocument =
            serde_json::from_value(json!({"type": "kv", "options": null})).unwrap();
        assert_eq!(no_options.options_version(), None);
    }

    #[test]
    fn test_license_prefers_autoloaded() {
        let status: LicenseStatusDocument = serde_json::from_value(json!({
            "autoloaded": {
                "license_id": "lic-1",
                "expiration_time": "2030-01-01T00:00:00Z",
                "features": ["Namespaces", "Sentinel"]
            }
        }))
        .unwrap();
        let license = status.into_license().unwrap();
        assert_eq!(license.license_id.as_deref(), Some("lic-1"));
        assert_eq!(license.features.len(), 2);

        let inline: LicenseStatusDocument =
            serde_json::from_value(json!({"license_id": "lic-2"})).unwrap();
        assert_eq!(inline.into_license().unwrap().license_id.as_deref(), Some("lic-2"));

        let none: LicenseStatusDocument = serde_json::from_value(json!({})).unwrap();
        assert!(none.into_license().is_none());
    }
}
