//! In-memory [`VaultApi`] for unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use vault_model::{namespace::normalize_path, NamespaceContext};

use super::{ApiError, ApiResult, VaultApi};

type Key = (String, String);

/// Canned listings, documents and errors keyed by namespace path and API path.
#[derive(Default)]
pub(crate) struct FakeVault {
    lists: HashMap<Key, Vec<String>>,
    documents: HashMap<Key, Value>,
    errors: HashMap<Key, ApiError>,
    calls: Mutex<Vec<String>>,
}

impl FakeVault {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_list(mut self, namespace: &str, path: &str, keys: &[&str]) -> Self {
        self.lists.insert(
            key(namespace, path),
            keys.iter().map(|k| k.to_string()).collect(),
        );
        self
    }

    pub(crate) fn with_document(mut self, namespace: &str, path: &str, body: Value) -> Self {
        self.documents.insert(key(namespace, path), body);
        self
    }

    pub(crate) fn with_error(mut self, namespace: &str, path: &str, error: ApiError) -> Self {
        self.errors.insert(key(namespace, path), error);
        self
    }

    /// Requests seen so far, as `"<VERB> <namespace>|<path>"`.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, verb: &str, namespace: &NamespaceContext, path: &str) -> Key {
        let key = key(namespace.path(), path);
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}|{}", verb, key.0, key.1));
        key
    }
}

fn key(namespace: &str, path: &str) -> Key {
    (normalize_path(namespace), path.to_string())
}

#[async_trait]
impl VaultApi for FakeVault {
    async fn list(&self, path: &str, namespace: &NamespaceContext) -> ApiResult<Vec<String>> {
        let key = self.record("LIST", namespace, path);
        if let Some(error) = self.errors.get(&key) {
            return Err(error.clone());
        }
        Ok(self.lists.get(&key).cloned().unwrap_or_default())
    }

    async fn get(&self, path: &str, namespace: &NamespaceContext) -> ApiResult<Option<Value>> {
        let key = self.record("GET", namespace, path);
        if let Some(error) = self.errors.get(&key) {
            return Err(error.clone());
        }
        Ok(self.documents.get(&key).cloned())
    }
}
