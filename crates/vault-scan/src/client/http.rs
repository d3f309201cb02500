//! HTTP implementation of [`VaultApi`].
//!
//! Listing is issued as `GET <path>?list=true`, which Vault treats exactly
//! like the `LIST` verb.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, error, instrument};
use vault_model::NamespaceContext;

use super::config::{api_url, ConfigError, VaultEndpoint};
use super::{ApiError, ApiResult, VaultApi};
use crate::retry::RetryConfig;

const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";
const LIST_QUERY: &[(&str, &str)] = &[("list", "true")];

/// Vault client over reqwest.
///
/// Transient failures are retried with exponential backoff; the client is
/// cheap to clone.
#[derive(Clone)]
pub struct HttpVaultClient {
    /// HTTP client instance.
    client: Client,

    /// Parsed server address.
    base: Url,

    /// Server address and credentials.
    endpoint: VaultEndpoint,

    /// Retry policy for transient failures.
    retry: RetryConfig,
}

impl HttpVaultClient {
    /// Create a client for an endpoint.
    pub fn new(endpoint: VaultEndpoint) -> Result<Self, ConfigError> {
        let base = endpoint.base_url()?;
        let client = Client::builder()
            .timeout(endpoint.timeout())
            .danger_accept_invalid_certs(!endpoint.verify_tls)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base,
            retry: endpoint.retry_config(),
            endpoint,
        })
    }

    /// Replace the retry policy.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &VaultEndpoint {
        &self.endpoint
    }

    async fn request(
        &self,
        path: &str,
        query: &[(&str, &str)],
        namespace: &NamespaceContext,
    ) -> ApiResult<Option<Value>> {
        self.retry
            .run(path, || self.send_once(path, query, namespace))
            .await
    }

    async fn send_once(
        &self,
        path: &str,
        query: &[(&str, &str)],
        namespace: &NamespaceContext,
    ) -> ApiResult<Option<Value>> {
        let mut request = self
            .client
            .get(api_url(&self.base, path))
            .header(TOKEN_HEADER, &self.endpoint.token);

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(ns) = namespace.header_value() {
            request = request.header(NAMESPACE_HEADER, ns);
        }

        let response = request.send().await.map_err(|e| ApiError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        self.handle_response(path, response).await
    }

    /// Handle an API response and parse its JSON body.
    async fn handle_response(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> ApiResult<Option<Value>> {
        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        if status.is_success() {
            if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
                return Ok(None);
            }
            return serde_json::from_str(&body)
                .map(Some)
                .map_err(|e| ApiError::Malformed {
                    path: path.to_string(),
                    message: e.to_string(),
                });
        }

        if status == StatusCode::UNAUTHORIZED {
            error!(path = %path, "Vault rejected the token");
        }
        classify_failure(status.as_u16(), path, &body)
    }
}

/// Map a non-success status to an outcome.
///
/// A plain 404 is an absent resource, not an error.
pub(crate) fn classify_failure(status: u16, path: &str, body: &str) -> ApiResult<Option<Value>> {
    let message = error_message(body);
    let lower = message.to_lowercase();
    let path = path.to_string();

    match status {
        404 if lower.contains("unsupported path") => {
            Err(ApiError::FeatureUnavailable { path, message })
        }
        404 => Ok(None),
        401 => Err(ApiError::Unauthorized { path, message }),
        403 if lower.contains("license") || lower.contains("feature") => {
            Err(ApiError::FeatureUnavailable { path, message })
        }
        403 => Err(ApiError::PermissionDenied { path }),
        400 | 405 if lower.contains("unsupported path") => {
            Err(ApiError::FeatureUnavailable { path, message })
        }
        501 => Err(ApiError::FeatureUnavailable { path, message }),
        429 | 500..=599 => Err(ApiError::Transport {
            path,
            message: format!("HTTP {}: {}", status, message),
        }),
        _ => Err(ApiError::Rejected {
            status,
            path,
            message,
        }),
    }
}

/// Join Vault's `{"errors": [...]}` list, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value.get("errors").and_then(Value::as_array).map(|errors| {
                errors
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("; ")
            })
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Extract `data.keys` from a listing response.
fn listing_keys(path: &str, body: &Value) -> ApiResult<Vec<String>> {
    let malformed = |message: &str| ApiError::Malformed {
        path: path.to_string(),
        message: message.to_string(),
    };

    match body.get("data").and_then(|data| data.get("keys")) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| malformed("listing key is not a string"))
            })
            .collect(),
        Some(_) => Err(malformed("listing keys are not an array")),
    }
}

#[async_trait]
impl VaultApi for HttpVaultClient {
    #[instrument(skip(self), fields(namespace = %namespace))]
    async fn list(&self, path: &str, namespace: &NamespaceContext) -> ApiResult<Vec<String>> {
        debug!("Listing {}", path);

        match self.request(path, LIST_QUERY, namespace).await? {
            Some(body) => listing_keys(path, &body),
            None => Ok(Vec::new()),
        }
    }

    #[instrument(skip(self), fields(namespace = %namespace))]
    async fn get(&self, path: &str, namespace: &NamespaceContext) -> ApiResult<Option<Value>> {
        debug!("Reading {}", path);
        self.request(path, &[], namespace).await
    }

    #[instrument(skip(self, query), fields(namespace = %namespace))]
    async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, &str)],
        namespace: &NamespaceContext,
    ) -> ApiResult<Option<Value>> {
        debug!("Reading {}", path);
        self.request(path, query, namespace).await
    }
}
