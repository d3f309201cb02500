//! Scan diagnostics.
//!
//! Recoverable failures never abort a scan. Each one is logged and recorded
//! here so the snapshot states exactly what could not be read.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};
use vault_model::NamespaceContext;

use crate::client::ApiError;

/// Category of a recoverable failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A referenced object does not exist.
    NotFound,
    /// The endpoint is missing, unlicensed or not readable with this token.
    FeatureUnavailable,
    /// Network failure that persisted through retries.
    TransientTransport,
    /// The response could not be decoded.
    Malformed,
    /// Traversal stopped at the configured depth limit.
    Truncated,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::NotFound => "not_found",
            DiagnosticKind::FeatureUnavailable => "feature_unavailable",
            DiagnosticKind::TransientTransport => "transient_transport",
            DiagnosticKind::Malformed => "malformed",
            DiagnosticKind::Truncated => "truncated",
        }
    }
}

/// A recorded failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Namespace path the request ran in
    pub namespace: String,
    /// API path involved
    pub path: String,
    pub message: String,
}

/// Shared diagnostic channel.
///
/// Clones share the same buffer. Entries are only ever appended until the
/// owner drains the channel with [`Diagnostics::take`] or
/// [`Diagnostics::clear`].
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl Diagnostics {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure.
    pub fn record(
        &self,
        kind: DiagnosticKind,
        namespace: &NamespaceContext,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            namespace: namespace.path().to_string(),
            path: path.into(),
            message: message.into(),
        };

        match kind {
            DiagnosticKind::NotFound => debug!(
                namespace = %namespace,
                path = %diagnostic.path,
                "{}", diagnostic.message
            ),
            _ => warn!(
                namespace = %namespace,
                path = %diagnostic.path,
                kind = kind.as_str(),
                "{}", diagnostic.message
            ),
        }

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }

    /// Record an API error under its category.
    pub fn record_error(&self, error: &ApiError, namespace: &NamespaceContext) {
        self.record(error.kind(), namespace, error.path(), error.to_string());
    }

    /// Copy of everything recorded so far.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Discard everything recorded so far.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of diagnostics of one kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| d.kind == kind)
            .count()
    }
}
