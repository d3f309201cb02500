//! Audit devices

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An enabled audit device (`sys/audit`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditDevice {
    /// Device path, slash-terminated (e.g. `file/`)
    pub path: String,
    /// `file`, `syslog` or `socket`
    pub device_type: String,
    pub namespace: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub local: bool,
    /// Device options such as `file_path` or `address`
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}
