//! Step-wise traversals.
//!
//! Vault only offers flat listings, so trees are walked with an explicit work
//! stack. Each walker yields one record per `next()` call and can be stopped
//! between steps; a new walker always starts from scratch.

pub mod namespaces;
pub mod secrets;

pub use namespaces::NamespaceWalker;
pub use secrets::SecretWalker;
