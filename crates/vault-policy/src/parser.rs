//! # Policy Rule Parser
//!
//! Extracts `(path, capabilities)` rules from ACL policy text.
//!
//! The parser is line oriented and deliberately forgiving: it never fails.
//! Anything it cannot make sense of degrades to an empty capability list or is
//! skipped, so a single malformed block cannot hide the rest of a policy.
//!
//! ```text
//! path "secret/*" {
//!   capabilities = ["read", "list"]
//! }
//! ```

use crate::rules::PolicyRule;

/// Parse policy text into rules, in declaration order.
///
/// - A line starting with `path` opens a block; the pattern is the first
///   double-quoted string on the line. The previously open block is flushed
///   first.
/// - A `capabilities = [...]` line sets the open block's capabilities. A list
///   whose `[` is not closed on the same line continues on following lines; if
///   another `path` line or the end of input arrives first, the block gets an
///   empty capability list.
/// - A block with no capabilities line yields a rule with no capabilities.
/// - `#` and `//` start a comment that runs to the end of the line, unless
///   they appear inside a quoted string.
///
/// # Example
///
/// ```
/// use vault_policy::parser::parse_policy;
///
/// let rules = parse_policy(r#"
/// path "secret/*" {
///   capabilities = ["read", "list"]
/// }
/// path "sys/health" { capabilities = ["read"] }
/// "#);
///
/// assert_eq!(rules.len(), 2);
/// assert_eq!(rules[0].path, "secret/*");
/// assert_eq!(rules[0].capabilities, vec!["read", "list"]);
/// assert_eq!(rules[1].capabilities, vec!["read"]);
/// ```
pub fn parse_policy(text: &str) -> Vec<PolicyRule> {
    let mut rules = Vec::new();
    let mut open: Option<OpenBlock> = None;

    for raw in text.lines() {
        let line = strip_comment(raw.trim());
        if line.is_empty() {
            continue;
        }

        if is_path_declaration(line) {
            if let Some(block) = open.take() {
                rules.push(block.finish());
            }
            open = quoted_path(line).map(OpenBlock::new);

            // Single-line form: path "x" { capabilities = [...] }
            if let Some(block) = open.as_mut() {
                if let Some(start) = line.find("capabilities") {
                    block.capability_line(&line[start..]);
                }
            }
            continue;
        }

        let Some(block) = open.as_mut() else {
            continue;
        };

        if block.pending.is_some() {
            block.continue_list(line);
        } else if line.starts_with("capabilities") && line.contains('=') {
            block.capability_line(line);
        }
    }

    if let Some(block) = open.take() {
        rules.push(block.finish());
    }

    rules
}

/// A path block that has been opened but not yet flushed.
struct OpenBlock {
    path: String,
    capabilities: Vec<String>,
    /// Text of a capability list whose closing bracket has not been seen.
    pending: Option<String>,
}

impl OpenBlock {
    fn new(path: String) -> Self {
        Self {
            path,
            capabilities: Vec::new(),
            pending: None,
        }
    }

    /// Handle `capabilities = [ ... ]`, starting at the `capabilities` keyword.
    fn capability_line(&mut self, line: &str) {
        self.capabilities.clear();
        self.pending = None;

        let Some((_, value)) = line.split_once('=') else {
            return;
        };
        let Some(list) = value.trim().strip_prefix('[') else {
            return;
        };

        match list.split_once(']') {
            Some((inner, _)) => self.capabilities = split_tokens(inner),
            None => self.pending = Some(list.to_string()),
        }
    }

    /// Feed one more line into an unterminated capability list.
    fn continue_list(&mut self, line: &str) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        pending.push(' ');
        pending.push_str(line);

        if let Some((inner, _)) = pending.split_once(']') {
            self.capabilities = split_tokens(inner);
            self.pending = None;
        }
    }

    fn finish(self) -> PolicyRule {
        if self.pending.is_some() {
            // The list was never closed.
            return PolicyRule::new(self.path);
        }
        PolicyRule::new(self.path).with_capabilities(self.capabilities)
    }
}

fn is_path_declaration(line: &str) -> bool {
    match line.strip_prefix("path") {
        Some(rest) => rest.starts_with(|c: char| c.is_whitespace() || c == '"'),
        None => false,
    }
}

fn quoted_path(line: &str) -> Option<String> {
    line.split('"').nth(1).map(str::to_string)
}

/// Cut a trailing `#` or `//` comment that is not inside quotes.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut chars = line.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '#' => return line[..index].trim_end(),
                '/' if matches!(chars.peek(), Some((_, '/'))) => {
                    return line[..index].trim_end();
                }
                _ => {}
            },
        }
    }
    line
}

fn split_tokens(inner: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in inner.split(',') {
        let token = token
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'')
            .trim();
        if token.is_empty() {
            continue;
        }
        if !tokens.iter().any(|existing| existing == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}
