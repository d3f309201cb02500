//! Vault API client.
//!
//! The scanner only ever reads. Every call names the namespace it runs in
//! through a [`NamespaceContext`]; the client keeps no current namespace.
//!
//! - [`VaultApi`]: the two primitives the scanner needs (`list` and `get`)
//! - [`HttpVaultClient`]: the reqwest implementation
//! - [`fetch_document`]: typed access to a response's `data` envelope

pub mod config;
pub mod documents;
pub mod http;

#[cfg(test)]
pub(crate) mod fake;

pub use config::{ConfigError, GroupInheritance, ScanConfig, VaultEndpoint};
pub use http::HttpVaultClient;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use vault_model::NamespaceContext;

use crate::diagnostics::DiagnosticKind;

/// API errors.
///
/// A 404 is not an error: it surfaces as an empty listing or an absent
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The token was rejected (401).
    #[error("Unauthorized at {path}: {message}")]
    Unauthorized {
        /// API path.
        path: String,
        /// Error message from Vault.
        message: String,
    },

    /// The token lacks a capability on the path (403).
    #[error("Permission denied at {path}")]
    PermissionDenied {
        /// API path.
        path: String,
    },

    /// The endpoint does not exist on this server (OSS build, missing license,
    /// auth method not mounted).
    #[error("Feature unavailable at {path}: {message}")]
    FeatureUnavailable {
        /// API path.
        path: String,
        /// Error message from Vault.
        message: String,
    },

    /// The request was refused for another reason.
    #[error("Request rejected ({status}) at {path}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// API path.
        path: String,
        /// Error message from Vault.
        message: String,
    },

    /// Connection failure, timeout, rate limiting or server error.
    #[error("Transport failure at {path}: {message}")]
    Transport {
        /// API path.
        path: String,
        /// Error description.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Malformed response from {path}: {message}")]
    Malformed {
        /// API path.
        path: String,
        /// Decoding error.
        message: String,
    },
}

impl ApiError {
    /// The diagnostic category this error is recorded under.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            ApiError::Unauthorized { .. }
            | ApiError::PermissionDenied { .. }
            | ApiError::FeatureUnavailable { .. }
            | ApiError::Rejected { .. } => DiagnosticKind::FeatureUnavailable,
            ApiError::Transport { .. } => DiagnosticKind::TransientTransport,
            ApiError::Malformed { .. } => DiagnosticKind::Malformed,
        }
    }

    /// Whether retrying the request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }

    /// The API path the error occurred at.
    pub fn path(&self) -> &str {
        match self {
            ApiError::Unauthorized { path, .. }
            | ApiError::PermissionDenied { path }
            | ApiError::FeatureUnavailable { path, .. }
            | ApiError::Rejected { path, .. }
            | ApiError::Transport { path, .. }
            | ApiError::Malformed { path, .. } => path,
        }
    }
}

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Read access to a Vault server.
#[async_trait]
pub trait VaultApi: Send + Sync {
    /// List the keys below a path. Folder keys end in `/`.
    ///
    /// A path that does not exist yields an empty list.
    async fn list(&self, path: &str, namespace: &NamespaceContext) -> ApiResult<Vec<String>>;

    /// Read the JSON body at a path, `None` if it does not exist.
    async fn get(&self, path: &str, namespace: &NamespaceContext) -> ApiResult<Option<Value>>;

    /// Read a path with query parameters.
    ///
    /// Implementations that cannot send parameters read the plain path.
    async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, &str)],
        namespace: &NamespaceContext,
    ) -> ApiResult<Option<Value>> {
        let _ = query;
        self.get(path, namespace).await
    }
}

/// Read a path and decode its `data` envelope into `T`.
///
/// Bodies without a `data` member (such as `sys/health`) are decoded whole.
/// A `null` envelope is treated as absent.
pub async fn fetch_document<T, A>(
    api: &A,
    path: &str,
    namespace: &NamespaceContext,
) -> ApiResult<Option<T>>
where
    T: DeserializeOwned,
    A: VaultApi + ?Sized,
{
    let body = api.get(path, namespace).await?;
    decode_document(path, body)
}

/// Decode the `data` envelope of a body read from `path`.
pub(crate) fn decode_document<T: DeserializeOwned>(
    path: &str,
    body: Option<Value>,
) -> ApiResult<Option<T>> {
    let Some(body) = body else {
        return Ok(None);
    };

    let data = match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    };

    if data.is_null() {
        return Ok(None);
    }

    serde_json::from_value(data)
        .map(Some)
        .map_err(|e| ApiError::Malformed {
            path: path.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::fake::FakeVault;
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
    }

    #[tokio::test]
    async fn test_fetch_document_unwraps_envelope() {
        let root = NamespaceContext::root();
        let api = FakeVault::new()
            .with_document("", "wrapped", json!({"request_id": "r-1", "data": {"name": "inner"}}))
            .with_document("", "bare", json!({"name": "bare"}))
            .with_document("", "null", json!({"data": null}));

        let wrapped: Option<Sample> = fetch_document(&api, "wrapped", &root).await.unwrap();
        assert_eq!(wrapped, Some(Sample { name: "inner".into() }));

        let bare: Option<Sample> = fetch_document(&api, "bare", &root).await.unwrap();
        assert_eq!(bare, Some(Sample { name: "bare".into() }));

        let null: Option<Sample> = fetch_document(&api, "null", &root).await.unwrap();
        assert_eq!(null, None);

        let missing: Option<Sample> = fetch_document(&api, "missing", &root).await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_fetch_document_reports_malformed() {
        let root = NamespaceContext::root();
        let api = FakeVault::new().with_document("", "bad", json!({"data": {"name": 42}}));

        let result: ApiResult<Option<Sample>> = fetch_document(&api, "bad", &root).await;
        assert!(matches!(result, Err(ApiError::Malformed { .. })));
    }

    #[test]
    fn test_error_categories() {
        let transport = ApiError::Transport {
            path: "sys/mounts".into(),
            message: "timeout".into(),
        };
        assert!(transport.is_transient());
        assert_eq!(transport.kind(), DiagnosticKind::TransientTransport);
        assert_eq!(transport.path(), "sys/mounts");

        let denied = ApiError::PermissionDenied {
            path: "sys/policies/egp".into(),
        };
        assert!(!denied.is_transient());
        assert_eq!(denied.kind(), DiagnosticKind::FeatureUnavailable);

        let malformed = ApiError::Malformed {
            path: "x".into(),
            message: "eof".into(),
        };
        assert_eq!(malformed.kind(), DiagnosticKind::Malformed);
    }
}
