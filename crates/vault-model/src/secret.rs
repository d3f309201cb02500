//! Secret path records
//!
//! A secret node is either a folder (listing key ending in `/`) or a leaf.
//! Leaves under KV v2 mounts carry version metadata; folders never do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mount::{EngineType, Mount};

/// A folder or leaf below a mount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecretNode {
    /// Mount path followed by the relative path
    pub full_path: String,

    /// Path relative to the mount; folders keep their trailing slash
    pub relative_path: String,

    /// Last path segment, without slash
    pub name: String,

    /// Path of the mount the node lives under
    pub mount: String,

    /// Engine type of the mount
    pub engine_type: EngineType,

    /// Whether this node is a folder
    pub is_folder: bool,

    /// Path of the namespace the mount lives in
    pub namespace: String,

    /// Version metadata (KV v2 leaves only)
    pub version_metadata: Option<VersionMetadata>,
}

impl SecretNode {
    /// Create a folder node. `relative_path` must end in `/`.
    pub fn folder(mount: &Mount, relative_path: impl Into<String>) -> Self {
        Self::build(mount, relative_path.into(), true, None)
    }

    /// Create a leaf node.
    pub fn leaf(
        mount: &Mount,
        relative_path: impl Into<String>,
        version_metadata: Option<VersionMetadata>,
    ) -> Self {
        Self::build(mount, relative_path.into(), false, version_metadata)
    }

    fn build(
        mount: &Mount,
        relative_path: String,
        is_folder: bool,
        version_metadata: Option<VersionMetadata>,
    ) -> Self {
        let name = relative_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        Self {
            full_path: format!("{}{}", mount.path, relative_path),
            relative_path,
            name,
            mount: mount.path.clone(),
            engine_type: mount.engine_type,
            is_folder,
            namespace: mount.namespace.clone(),
            version_metadata: if is_folder { None } else { version_metadata },
        }
    }

    /// Number of segments below the mount (1 for direct children).
    pub fn depth(&self) -> usize {
        self.relative_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .count()
    }
}

/// Version metadata of a KV v2 secret.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VersionMetadata {
    /// Current version number
    pub version: u64,

    /// When the secret was first written
    pub created_time: Option<DateTime<Utc>>,

    /// When the secret was last written
    pub updated_time: Option<DateTime<Utc>>,

    /// When the current version was soft-deleted
    pub deletion_time: Option<DateTime<Utc>>,

    /// Whether the current version is destroyed
    #[serde(default)]
    pub destroyed: bool,
}

impl VersionMetadata {
    /// Check if the current version is deleted or destroyed.
    pub fn is_deleted(&self) -> bool {
        self.destroyed || self.deletion_time.is_some()
    }
}

/// Parse an RFC 3339 timestamp; empty or invalid input yields `None`.
///
/// Vault reports unset times as an empty string.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if value.trim().is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|time| time.with_timezone(&Utc))
}
