//! # Vault Policy
//!
//! Vocabulary and rule handling for HashiCorp Vault ACL policies.
//!
//! ## Overview
//!
//! The vault-policy crate handles:
//! - **Capabilities**: What a rule may grant on a path (`read`, `list`, `sudo`, ...)
//! - **Policy Kinds**: ACL, role governing (RGP) and endpoint governing (EGP)
//! - **Parsing**: Extracting `(path, capabilities)` rules from policy text
//! - **Rule Sets**: Matching request paths against rule patterns
//!
//! ## Policy Syntax
//!
//! ```text
//! path "secret/data/app/*" {
//!   capabilities = ["read", "list"]
//! }
//!
//! path "secret/data/app/+/config" {
//!   capabilities = ["deny"]
//! }
//! ```
//!
//! A trailing `*` matches any suffix; `+` matches exactly one path segment.
//!
//! ## Usage
//!
//! ```rust
//! use vault_policy::{parse_policy, Capability, RuleSet};
//!
//! let rules: RuleSet = parse_policy(r#"
//! path "secret/*" {
//!   capabilities = ["read", "list"]
//! }
//! path "secret/admin/*" {
//!   capabilities = ["deny"]
//! }
//! "#).into_iter().collect();
//!
//! assert!(rules.allows("secret/app/db", Capability::Read));
//! assert!(!rules.allows("secret/admin/root", Capability::Read));
//! assert!(!rules.allows("secret/app/db", Capability::Update));
//! ```
//!
//! ## Parser Guarantees
//!
//! Parsing never fails. Malformed blocks degrade to rules with empty
//! capability lists, so every `path` declaration with a quoted pattern is
//! accounted for in the output, in declaration order.

pub mod capabilities;
pub mod kinds;
pub mod parser;
pub mod rules;

// Re-export main types for convenience
pub use capabilities::Capability;
pub use kinds::PolicyKind;
pub use parser::parse_policy;
pub use rules::{glob_matches, PolicyRule, RuleSet};
