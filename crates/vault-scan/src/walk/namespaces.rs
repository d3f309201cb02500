//! Namespace discovery.
//!
//! ```text
//! Pending(ns, depth) ──list sys/namespaces──→ Listed(ns, children) ──exhausted──→ popped
//!                                                 │
//!                                                 └─ next child: emit, push Pending(child, depth + 1)
//! ```
//!
//! Children are emitted depth-first in listing order: a child's subtree is
//! complete before its next sibling appears.

use std::collections::VecDeque;
use tracing::{debug, instrument, warn};
use vault_model::Namespace;

use crate::client::documents::NamespaceDocument;
use crate::client::{fetch_document, VaultApi};
use crate::diagnostics::{DiagnosticKind, Diagnostics};

const NAMESPACES_PATH: &str = "sys/namespaces";

enum Frame {
    /// Namespace whose children have not been listed yet.
    Pending { namespace: Namespace, depth: usize },
    /// Namespace with children still to be emitted.
    Listed {
        namespace: Namespace,
        depth: usize,
        children: VecDeque<String>,
    },
}

/// Walks the namespace tree below a root.
///
/// The root itself is not part of the step sequence; it is available through
/// [`NamespaceWalker::root`].
pub struct NamespaceWalker<'a> {
    api: &'a dyn VaultApi,
    diagnostics: &'a Diagnostics,
    root: Namespace,
    max_depth: usize,
    stack: Vec<Frame>,
}

impl<'a> NamespaceWalker<'a> {
    /// Create a walker. With `follow_children` unset nothing is discovered.
    pub fn new(
        api: &'a dyn VaultApi,
        diagnostics: &'a Diagnostics,
        root: Namespace,
        follow_children: bool,
        max_depth: usize,
    ) -> Self {
        let stack = if follow_children {
            vec![Frame::Pending {
                namespace: root.clone(),
                depth: 0,
            }]
        } else {
            Vec::new()
        };

        Self {
            api,
            diagnostics,
            root,
            max_depth,
            stack,
        }
    }

    /// The namespace the walk starts from.
    pub fn root(&self) -> &Namespace {
        &self.root
    }

    /// Advance to the next namespace, `None` when the walk is done.
    pub async fn next(&mut self) -> Option<Namespace> {
        loop {
            match self.stack.pop()? {
                Frame::Pending { namespace, depth } => {
                    if depth >= self.max_depth {
                        self.diagnostics.record(
                            DiagnosticKind::Truncated,
                            &namespace.context(),
                            NAMESPACES_PATH,
                            format!("namespace depth limit {} reached", self.max_depth),
                        );
                        continue;
                    }

                    match self.api.list(NAMESPACES_PATH, &namespace.context()).await {
                        Ok(children) => {
                            debug!(namespace = %namespace.context(), count = children.len(), "Listed child namespaces");
                            self.stack.push(Frame::Listed {
                                namespace,
                                depth,
                                children: children.into(),
                            });
                        }
                        Err(err) => {
                            self.diagnostics.record_error(&err, &namespace.context());
                        }
                    }
                }
                Frame::Listed {
                    namespace,
                    depth,
                    mut children,
                } => {
                    let Some(name) = children.pop_front() else {
                        continue;
                    };
                    if name.trim_matches('/').is_empty() {
                        self.stack.push(Frame::Listed {
                            namespace,
                            depth,
                            children,
                        });
                        continue;
                    }

                    let child = self.describe(&namespace, &name).await;
                    self.stack.push(Frame::Listed {
                        namespace,
                        depth,
                        children,
                    });
                    self.stack.push(Frame::Pending {
                        namespace: child.clone(),
                        depth: depth + 1,
                    });
                    return Some(child);
                }
            }
        }
    }

    /// Run the walk to completion.
    pub async fn collect(mut self) -> Vec<Namespace> {
        let mut namespaces = Vec::new();
        while let Some(namespace) = self.next().await {
            namespaces.push(namespace);
        }
        namespaces
    }

    /// Build a child record, reading its detail document when available.
    #[instrument(skip(self, parent), fields(parent = %parent.context()))]
    async fn describe(&self, parent: &Namespace, name: &str) -> Namespace {
        let path = format!("{}/{}", NAMESPACES_PATH, name.trim_matches('/'));
        let context = parent.context();

        match fetch_document::<NamespaceDocument, _>(self.api, &path, &context).await {
            Ok(Some(document)) => {
                Namespace::child(parent, name, Some(document.id), document.custom_metadata)
            }
            Ok(None) => {
                self.diagnostics.record(
                    DiagnosticKind::NotFound,
                    &context,
                    path,
                    "namespace listed but detail missing",
                );
                Namespace::child(parent, name, None, Default::default())
            }
            Err(err) => {
                warn!(error = %err, "Using listing entry without namespace detail");
                self.diagnostics.record_error(&err, &context);
                Namespace::child(parent, name, None, Default::default())
            }
        }
    }
}
