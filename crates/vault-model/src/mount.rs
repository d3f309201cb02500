//! Secret engine mounts
//!
//! Only secret-bearing engines are scanned. Classification is an explicit
//! allow-list: system, identity, token and auth mounts, as well as engine
//! types this crate does not know, are excluded.

use serde::{Deserialize, Serialize};

/// Secret engine types included in a scan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EngineType {
    /// Key/value store, version 1 or 2
    Kv,
    /// Legacy key/value engine
    Generic,
    /// Per-token private storage
    Cubbyhole,
    /// Encryption as a service
    Transit,
    /// Certificate authority
    Pki,
    /// Dynamic database credentials
    Database,
}

impl EngineType {
    /// Get the engine type name as reported by `sys/mounts`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineType::Kv => "kv",
            EngineType::Generic => "generic",
            EngineType::Cubbyhole => "cubbyhole",
            EngineType::Transit => "transit",
            EngineType::Pki => "pki",
            EngineType::Database => "database",
        }
    }

    /// Parse an engine type. `kv-v2` is folded into [`EngineType::Kv`].
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "kv" | "kv-v2" => Some(EngineType::Kv),
            "generic" => Some(EngineType::Generic),
            "cubbyhole" => Some(EngineType::Cubbyhole),
            "transit" => Some(EngineType::Transit),
            "pki" => Some(EngineType::Pki),
            "database" => Some(EngineType::Database),
            _ => None,
        }
    }

    /// Get all included engine types.
    pub fn all() -> Vec<Self> {
        vec![
            EngineType::Kv,
            EngineType::Generic,
            EngineType::Cubbyhole,
            EngineType::Transit,
            EngineType::Pki,
            EngineType::Database,
        ]
    }

    /// Classify a `sys/mounts` entry into an engine type and engine version.
    ///
    /// Only KV mounts carry a version: `kv-v2` implies `"2"`, plain `kv`
    /// takes `options.version` and defaults to `"1"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vault_model::EngineType;
    ///
    /// assert_eq!(EngineType::classify("kv", Some("2")), Some((EngineType::Kv, Some("2".into()))));
    /// assert_eq!(EngineType::classify("kv", None), Some((EngineType::Kv, Some("1".into()))));
    /// assert_eq!(EngineType::classify("kv-v2", None), Some((EngineType::Kv, Some("2".into()))));
    /// assert_eq!(EngineType::classify("pki", Some("2")), Some((EngineType::Pki, None)));
    /// assert_eq!(EngineType::classify("identity", None), None);
    /// ```
    pub fn classify(raw_type: &str, options_version: Option<&str>) -> Option<(Self, Option<String>)> {
        let engine = Self::parse(raw_type)?;
        if engine != EngineType::Kv {
            return Some((engine, None));
        }

        if raw_type.trim().eq_ignore_ascii_case("kv-v2") {
            return Some((engine, Some("2".to_string())));
        }

        let version = options_version
            .map(str::trim)
            .filter(|version| !version.is_empty())
            .unwrap_or("1");
        Some((engine, Some(version.to_string())))
    }
}

/// A secret engine mount inside a namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mount {
    /// Slash-terminated mount path, unique within its namespace
    pub path: String,

    /// Engine type
    pub engine_type: EngineType,

    /// Engine version (`"1"`/`"2"` for KV, `None` otherwise)
    pub engine_version: Option<String>,

    /// Operator-supplied description
    #[serde(default)]
    pub description: String,

    /// Path of the namespace the mount lives in
    pub namespace: String,

    /// Mount accessor
    pub accessor: Option<String>,

    /// Whether the mount is local to this cluster (not replicated)
    #[serde(default)]
    pub local: bool,

    /// Whether seal wrapping is enabled
    #[serde(default)]
    pub seal_wrap: bool,

    /// Version of the plugin currently running
    pub running_version: Option<String>,
}

impl Mount {
    /// Create a mount; the path is made slash-terminated.
    pub fn new(path: &str, engine_type: EngineType, namespace: impl Into<String>) -> Self {
        let trimmed = path.trim().trim_matches('/');
        Self {
            path: format!("{}/", trimmed),
            engine_type,
            engine_version: None,
            description: String::new(),
            namespace: namespace.into(),
            accessor: None,
            local: false,
            seal_wrap: false,
            running_version: None,
        }
    }

    /// Set the engine version.
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.engine_version = version;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check if this is a KV version 2 mount.
    pub fn is_kv_v2(&self) -> bool {
        self.engine_type == EngineType::Kv && self.engine_version.as_deref() == Some("2")
    }

    /// How secrets below this mount are listed.
    pub fn listing_convention(&self) -> ListingConvention {
        ListingConvention::for_engine(self.engine_type, self.engine_version.as_deref())
    }
}

/// How an engine exposes its key hierarchy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ListingConvention {
    /// Keys are listed and described under `<mount>metadata/` (KV v2)
    Metadata,
    /// Keys are listed directly under `<mount>`
    Direct,
}

/// Engine/version pairs with a non-default listing convention.
const CONVENTIONS: &[(EngineType, Option<&str>, ListingConvention)] = &[
    (EngineType::Kv, Some("2"), ListingConvention::Metadata),
];

impl ListingConvention {
    /// Select the convention for an engine type and version.
    pub fn for_engine(engine_type: EngineType, engine_version: Option<&str>) -> Self {
        CONVENTIONS
            .iter()
            .find(|(engine, version, _)| *engine == engine_type && *version == engine_version)
            .map(|(_, _, convention)| *convention)
            .unwrap_or(ListingConvention::Direct)
    }

    /// API path to list the folder at `relative` (empty for the mount root).
    pub fn list_path(&self, mount_path: &str, relative: &str) -> String {
        match self {
            ListingConvention::Metadata => format!("{}metadata/{}", mount_path, relative),
            ListingConvention::Direct => format!("{}{}", mount_path, relative),
        }
    }

    /// API path holding version metadata for a leaf, if the engine keeps any.
    pub fn metadata_path(&self, mount_path: &str, relative: &str) -> Option<String> {
        match self {
            ListingConvention::Metadata => Some(format!("{}metadata/{}", mount_path, relative)),
            ListingConvention::Direct => None,
        }
    }
}
