//! Secret path traversal below a mount.
//!
//! Same state machine as namespace discovery: a pending folder is listed, its
//! entries are emitted one by one, and sub-folders are pushed for listing.
//! The engine's [`ListingConvention`] decides where listings and metadata
//! live.

use std::collections::VecDeque;
use tracing::debug;
use vault_model::{ListingConvention, Mount, NamespaceContext, SecretNode, VersionMetadata};

use crate::client::documents::SecretMetadataDocument;
use crate::client::{fetch_document, VaultApi};
use crate::diagnostics::{DiagnosticKind, Diagnostics};

enum Frame {
    /// Folder not listed yet (`relative` is empty for the mount root).
    Pending { relative: String, depth: usize },
    /// Folder with entries still to be emitted.
    Listed {
        relative: String,
        depth: usize,
        entries: VecDeque<String>,
    },
}

/// Walks the folders and leaves of one mount.
pub struct SecretWalker<'a> {
    api: &'a dyn VaultApi,
    diagnostics: &'a Diagnostics,
    mount: &'a Mount,
    context: NamespaceContext,
    convention: ListingConvention,
    max_depth: usize,
    stack: Vec<Frame>,
}

impl<'a> SecretWalker<'a> {
    pub fn new(
        api: &'a dyn VaultApi,
        diagnostics: &'a Diagnostics,
        mount: &'a Mount,
        max_depth: usize,
    ) -> Self {
        Self {
            api,
            diagnostics,
            mount,
            context: NamespaceContext::new(&mount.namespace),
            convention: mount.listing_convention(),
            max_depth,
            stack: vec![Frame::Pending {
                relative: String::new(),
                depth: 0,
            }],
        }
    }

    /// Advance to the next node, `None` when the mount is exhausted.
    pub async fn next(&mut self) -> Option<SecretNode> {
        loop {
            match self.stack.pop()? {
                Frame::Pending { relative, depth } => {
                    let path = self.convention.list_path(&self.mount.path, &relative);
                    if depth >= self.max_depth {
                        self.diagnostics.record(
                            DiagnosticKind::Truncated,
                            &self.context,
                            path,
                            format!("secret depth limit {} reached", self.max_depth),
                        );
                        continue;
                    }

                    match self.api.list(&path, &self.context).await {
                        Ok(entries) => {
                            debug!(path = %path, count = entries.len(), "Listed secrets");
                            self.stack.push(Frame::Listed {
                                relative,
                                depth,
                                entries: entries.into(),
                            });
                        }
                        Err(err) => self.diagnostics.record_error(&err, &self.context),
                    }
                }
                Frame::Listed {
                    relative,
                    depth,
                    mut entries,
                } => {
                    let Some(entry) = entries.pop_front() else {
                        continue;
                    };
                    let child = format!("{}{}", relative, entry.trim_start_matches('/'));
                    self.stack.push(Frame::Listed {
                        relative,
                        depth,
                        entries,
                    });

                    if entry.trim_matches('/').is_empty() {
                        continue;
                    }

                    if child.ends_with('/') {
                        self.stack.push(Frame::Pending {
                            relative: child.clone(),
                            depth: depth + 1,
                        });
                        return Some(SecretNode::folder(self.mount, child));
                    }

                    let metadata = self.version_metadata(&child).await;
                    return Some(SecretNode::leaf(self.mount, child, metadata));
                }
            }
        }
    }

    /// Run the walk to completion.
    pub async fn collect(mut self) -> Vec<SecretNode> {
        let mut nodes = Vec::new();
        while let Some(node) = self.next().await {
            nodes.push(node);
        }
        nodes
    }

    async fn version_metadata(&self, relative: &str) -> Option<VersionMetadata> {
        let path = self.convention.metadata_path(&self.mount.path, relative)?;

        match fetch_document::<SecretMetadataDocument, _>(self.api, &path, &self.context).await {
            Ok(Some(document)) => Some(document.into_version_metadata()),
            Ok(None) => {
                self.diagnostics.record(
                    DiagnosticKind::NotFound,
                    &self.context,
                    path,
                    "secret listed but metadata missing",
                );
                None
            }
            Err(err) => {
                self.diagnostics.record_error(&err, &self.context);
                None
            }
        }
    }
}
