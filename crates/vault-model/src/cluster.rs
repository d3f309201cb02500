//! Cluster information
//!
//! Best-effort facts about the scanned cluster. Every field is optional since
//! the endpoints behind them may be unavailable to the scanning token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Facts gathered from `sys/health` and `sys/license/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClusterInfo {
    /// Server version, e.g. `1.15.2+ent`
    pub version: Option<String>,
    pub cluster_name: Option<String>,
    pub cluster_id: Option<String>,
    pub initialized: Option<bool>,
    pub sealed: Option<bool>,
    pub standby: Option<bool>,
    /// Installed license, `None` on OSS or when unreadable
    pub license: Option<LicenseInfo>,
}

impl ClusterInfo {
    /// Check if the server reports an Enterprise build.
    pub fn is_enterprise(&self) -> bool {
        self.license.is_some()
            || self
                .version
                .as_deref()
                .is_some_and(|version| version.contains("+ent"))
    }
}

/// An installed Enterprise license.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LicenseInfo {
    pub license_id: Option<String>,
    pub expiration_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enterprise_detection() {
        assert!(!ClusterInfo::default().is_enterprise());

        let ent = ClusterInfo {
            version: Some("1.15.2+ent".into()),
            ..Default::default()
        };
        assert!(ent.is_enterprise());

        let licensed = ClusterInfo {
            version: Some("1.15.2".into()),
            license: Some(LicenseInfo::default()),
            ..Default::default()
        };
        assert!(licensed.is_enterprise());
    }
}
