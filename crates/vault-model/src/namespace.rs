//! Namespace records and per-request namespace context
//!
//! Namespaces form a tree addressed by slash-terminated paths. The top-level
//! root has an empty path; every other namespace's path is its parent's path
//! followed by its own name and a slash.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier reported for the top-level root namespace.
pub const ROOT_NAMESPACE_ID: &str = "root";

/// A namespace discovered during a scan.
///
/// # Examples
///
/// ```
/// use vault_model::Namespace;
///
/// let root = Namespace::root("");
/// let team = Namespace::child(&root, "team-a", None, Default::default());
/// let nested = Namespace::child(&team, "payments/", Some("Xy1z".into()), Default::default());
///
/// assert_eq!(nested.path, "team-a/payments/");
/// assert_eq!(nested.parent_path.as_deref(), Some("team-a/"));
/// assert_eq!(nested.name, "payments");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Namespace {
    /// Vault-assigned namespace id (the path when Vault reported none)
    pub id: String,

    /// Slash-terminated hierarchical path; empty for the top-level root
    pub path: String,

    /// Last path segment, without slash
    pub name: String,

    /// Path of the parent namespace; `None` only for the scan root
    pub parent_path: Option<String>,

    /// Custom metadata attached to the namespace
    #[serde(default)]
    pub custom_metadata: HashMap<String, serde_json::Value>,
}

impl Namespace {
    /// Create the scan root from a configured namespace path.
    ///
    /// The path is normalised: surrounding whitespace and leading slashes are
    /// removed and a trailing slash is added when the path is not empty.
    pub fn root(path: &str) -> Self {
        let path = normalize_path(path);
        let name = last_segment(&path).to_string();
        let id = if path.is_empty() {
            ROOT_NAMESPACE_ID.to_string()
        } else {
            path.clone()
        };

        Self {
            id,
            path,
            name,
            parent_path: None,
            custom_metadata: HashMap::new(),
        }
    }

    /// Create a child of `parent` from a listing entry.
    ///
    /// `name` may carry the trailing slash Vault puts on listing keys.
    pub fn child(
        parent: &Namespace,
        name: &str,
        id: Option<String>,
        custom_metadata: HashMap<String, serde_json::Value>,
    ) -> Self {
        let name = name.trim().trim_matches('/').to_string();
        let path = format!("{}{}/", parent.path, name);

        Self {
            id: id.filter(|id| !id.is_empty()).unwrap_or_else(|| path.clone()),
            path,
            name,
            parent_path: Some(parent.path.clone()),
            custom_metadata,
        }
    }

    /// Check if this is the scan root.
    pub fn is_root(&self) -> bool {
        self.parent_path.is_none()
    }

    /// Check if this is the top-level (empty path) namespace.
    pub fn is_top_level(&self) -> bool {
        self.path.is_empty()
    }

    /// Number of path segments (0 for the top-level root).
    pub fn depth(&self) -> usize {
        self.path.split('/').filter(|segment| !segment.is_empty()).count()
    }

    /// The context under which API calls for this namespace are issued.
    pub fn context(&self) -> NamespaceContext {
        NamespaceContext::new(&self.path)
    }
}

/// The namespace an API call is issued in.
///
/// Passed explicitly to every request; the client never keeps a current
/// namespace of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NamespaceContext {
    path: String,
}

impl NamespaceContext {
    /// Create a context for a namespace path.
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_path(path),
        }
    }

    /// The top-level root context.
    pub fn root() -> Self {
        Self::default()
    }

    /// Slash-terminated namespace path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Check if requests go to the top-level root.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Value for the `X-Vault-Namespace` header, `None` for the top-level root.
    pub fn header_value(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            Some(self.path.trim_end_matches('/'))
        }
    }
}

impl fmt::Display for NamespaceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "(root)")
        } else {
            write!(f, "{}", self.path)
        }
    }
}

/// Normalise a namespace path to the slash-terminated form.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}
