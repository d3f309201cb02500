//! Vault endpoint and scan configuration.
//!
//! Configuration is loaded from environment variables with defaults suitable
//! for a local dev server, then checked with `validate()` before a scan
//! starts.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use vault_model::namespace::normalize_path;

use crate::retry::RetryConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Connection settings for a Vault server.
#[derive(Clone, Serialize, Deserialize)]
pub struct VaultEndpoint {
    /// Server address (e.g., "https://vault.example.com:8200").
    pub address: String,

    /// Token sent as `X-Vault-Token`.
    #[serde(skip_serializing, default)]
    pub token: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Retries after a transient failure.
    pub max_retries: u32,

    /// Whether to verify TLS certificates (disable only for testing).
    pub verify_tls: bool,
}

impl Default for VaultEndpoint {
    /// Returns defaults for a local dev server.
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: String::new(),
            timeout_secs: 30,
            max_retries: 3,
            verify_tls: true,
        }
    }
}

impl fmt::Debug for VaultEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultEndpoint")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

impl VaultEndpoint {
    /// Create an endpoint with default timeouts.
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    /// Load the endpoint from environment variables.
    ///
    /// Environment variables:
    /// - `VAULT_ADDR`: Server address (default: http://127.0.0.1:8200)
    /// - `VAULT_TOKEN`: Token used for every request
    /// - `VAULT_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `VAULT_MAX_RETRIES`: Retries after transient failures (default: 3)
    /// - `VAULT_SKIP_VERIFY`: Skip TLS verification when `true` or `1`
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            address: std::env::var("VAULT_ADDR").unwrap_or(default.address),
            token: std::env::var("VAULT_TOKEN").unwrap_or(default.token),
            timeout_secs: std::env::var("VAULT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            max_retries: std::env::var("VAULT_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_retries),
            verify_tls: std::env::var("VAULT_SKIP_VERIFY")
                .map(|s| s != "true" && s != "1")
                .unwrap_or(default.verify_tls),
        }
    }

    /// Parse the server address.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "VAULT_ADDR".to_string(),
            message,
        };

        let url = Url::parse(&self.address).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(invalid(format!("expected an http(s) URL, got {:?}", self.address)));
        }
        Ok(url)
    }

    /// Build the URL of an API path (`<address>/v1/<path>`).
    ///
    /// Each `/`-separated segment is percent-encoded, so keys containing `#`,
    /// `?` or `%` address exactly that key.
    pub fn url(&self, path: &str) -> Result<Url, ConfigError> {
        Ok(api_url(&self.base_url()?, path))
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy for transient failures.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::from_max_retries(self.max_retries)
    }

    /// Check that the endpoint can be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("VAULT_TOKEN".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "VAULT_TIMEOUT_SECS".to_string(),
                message: "timeout must be at least one second".to_string(),
            });
        }
        Ok(())
    }
}

/// Append `v1` and the segments of `path` to a base URL.
pub(crate) fn api_url(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .push("v1")
            .extend(path.trim_start_matches('/').split('/'));
    }
    url
}

/// How far group policies are inherited.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupInheritance {
    /// Entities get the policies of the groups they belong to; groups get the
    /// policies of their direct parents.
    #[default]
    Direct,
    /// Additionally follow parent groups of every group reached.
    Transitive,
}

impl GroupInheritance {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupInheritance::Direct => "direct",
            GroupInheritance::Transitive => "transitive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Some(GroupInheritance::Direct),
            "transitive" => Some(GroupInheritance::Transitive),
            _ => None,
        }
    }
}

/// What a scan covers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    /// Namespace the scan starts from; empty for the top-level root.
    pub root_namespace: String,

    /// Whether to discover child namespaces below the root.
    pub follow_child_namespaces: bool,

    /// Depth at which namespaces and secret folders stop being expanded.
    pub max_traversal_depth: usize,

    /// Group policy inheritance.
    pub group_inheritance: GroupInheritance,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_namespace: String::new(),
            follow_child_namespaces: true,
            max_traversal_depth: 32,
            group_inheritance: GroupInheritance::Direct,
        }
    }
}

impl ScanConfig {
    /// Load scan settings from environment variables.
    ///
    /// Environment variables:
    /// - `VAULT_NAMESPACE`: Root namespace of the scan (default: top-level)
    /// - `SCAN_FOLLOW_CHILD_NAMESPACES`: Discover child namespaces (default: true)
    /// - `SCAN_MAX_DEPTH`: Maximum traversal depth (default: 32)
    /// - `SCAN_GROUP_INHERITANCE`: `direct` or `transitive` (default: direct)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            root_namespace: std::env::var("VAULT_NAMESPACE").unwrap_or(default.root_namespace),
            follow_child_namespaces: std::env::var("SCAN_FOLLOW_CHILD_NAMESPACES")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.follow_child_namespaces),
            max_traversal_depth: std::env::var("SCAN_MAX_DEPTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_traversal_depth),
            group_inheritance: std::env::var("SCAN_GROUP_INHERITANCE")
                .ok()
                .and_then(|s| GroupInheritance::parse(&s))
                .unwrap_or(default.group_inheritance),
        }
    }

    /// Builder: start the scan from a namespace.
    pub fn with_root_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.root_namespace = namespace.into();
        self
    }

    /// Builder: set whether child namespaces are discovered.
    pub fn with_follow_child_namespaces(mut self, follow: bool) -> Self {
        self.follow_child_namespaces = follow;
        self
    }

    /// Builder: set the traversal depth limit.
    pub fn with_max_traversal_depth(mut self, depth: usize) -> Self {
        self.max_traversal_depth = depth;
        self
    }

    /// Builder: set the group inheritance mode.
    pub fn with_group_inheritance(mut self, inheritance: GroupInheritance) -> Self {
        self.group_inheritance = inheritance;
        self
    }

    /// The root namespace in slash-terminated form.
    pub fn normalized_root(&self) -> String {
        normalize_path(&self.root_namespace)
    }

    /// Check the depth limit and that the root namespace is a well-formed
    /// path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_traversal_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SCAN_MAX_DEPTH".to_string(),
                message: "depth limit must be at least 1".to_string(),
            });
        }

        let root = self.normalized_root();
        let invalid = |message: &str| ConfigError::InvalidValue {
            key: "VAULT_NAMESPACE".to_string(),
            message: format!("{} in {:?}", message, self.root_namespace),
        };

        for segment in root.trim_end_matches('/').split('/').filter(|_| !root.is_empty()) {
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }
            if segment == "." || segment == ".." {
                return Err(invalid("relative path segment"));
            }
            if segment.chars().any(|c| c.is_whitespace() || c.is_control()) {
                return Err(invalid("whitespace in path segment"));
            }
        }
        Ok(())
    }
}
