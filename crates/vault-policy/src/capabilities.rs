//! # Capabilities
//!
//! Defines the capabilities a Vault ACL rule can grant on a path.
//! Capabilities map onto the HTTP verbs a client may issue against a path.

use serde::{Deserialize, Serialize};

/// Capabilities that can appear in a `capabilities = [...]` list.
///
/// - **Create**: Write data to a path that does not exist yet
/// - **Read**: Read data at a path
/// - **Update**: Overwrite data at an existing path
/// - **Patch**: Partially update data at a path
/// - **Delete**: Remove data at a path
/// - **List**: List entries below a path
/// - **Sudo**: Access root-protected endpoints
/// - **Deny**: Explicitly refuse access, overriding every other capability
/// - **Subscribe**: Subscribe to events for a path
/// - **Recover**: Recover data from a snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Create data at a new path.
    Create,

    /// Read data at a path.
    Read,

    /// Update data at an existing path.
    Update,

    /// Partially update data at a path.
    Patch,

    /// Delete data at a path.
    Delete,

    /// List entries below a path.
    List,

    /// Access root-protected endpoints.
    ///
    /// Sudo is never implied by other capabilities.
    Sudo,

    /// Deny all access.
    ///
    /// A rule carrying `deny` grants nothing, whatever else it lists.
    Deny,

    /// Subscribe to events.
    Subscribe,

    /// Recover data from a snapshot.
    Recover,
}

impl Capability {
    /// Get the string representation of the capability as written in policy text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Create => "create",
            Capability::Read => "read",
            Capability::Update => "update",
            Capability::Patch => "patch",
            Capability::Delete => "delete",
            Capability::List => "list",
            Capability::Sudo => "sudo",
            Capability::Deny => "deny",
            Capability::Subscribe => "subscribe",
            Capability::Recover => "recover",
        }
    }

    /// Parse a capability token.
    ///
    /// Tokens are matched case-insensitively. Vault has no aliases, so
    /// anything outside the known vocabulary yields `None`.
    ///
    /// # Example
    ///
    /// ```
    /// use vault_policy::capabilities::Capability;
    ///
    /// assert_eq!(Capability::parse("read"), Some(Capability::Read));
    /// assert_eq!(Capability::parse("LIST"), Some(Capability::List));
    /// assert_eq!(Capability::parse("write"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "create" => Some(Capability::Create),
            "read" => Some(Capability::Read),
            "update" => Some(Capability::Update),
            "patch" => Some(Capability::Patch),
            "delete" => Some(Capability::Delete),
            "list" => Some(Capability::List),
            "sudo" => Some(Capability::Sudo),
            "deny" => Some(Capability::Deny),
            "subscribe" => Some(Capability::Subscribe),
            "recover" => Some(Capability::Recover),
            _ => None,
        }
    }

    /// Get all capabilities.
    pub fn all() -> Vec<Self> {
        vec![
            Capability::Create,
            Capability::Read,
            Capability::Update,
            Capability::Patch,
            Capability::Delete,
            Capability::List,
            Capability::Sudo,
            Capability::Deny,
            Capability::Subscribe,
            Capability::Recover,
        ]
    }

    /// Check if this is the explicit `deny` capability.
    pub fn is_deny(&self) -> bool {
        matches!(self, Capability::Deny)
    }

    /// Check if this capability only observes data.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Capability::Read | Capability::List | Capability::Subscribe)
    }

    /// Check if this capability modifies data.
    ///
    /// Audits use this to flag principals with write access to secret paths.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Capability::Create
                | Capability::Update
                | Capability::Patch
                | Capability::Delete
                | Capability::Recover
        )
    }

    /// Check if this capability is privileged (root-protected access).
    pub fn is_privileged(&self) -> bool {
        matches!(self, Capability::Sudo)
    }
}
