//! Operation and fragment definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A GraphQL operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// A query operation (read-only).
    #[default]
    Query,
    /// A mutation operation (modifies data).
    Mutation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Mutation => write!(f, "mutation"),
        }
    }
}

/// How a query interacts with the result cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FetchPolicy {
    /// Answer from the cache when every selected field is known, else fetch
    /// and store the result.
    #[default]
    CacheFirst,
    /// Always fetch, then store the result.
    NetworkOnly,
    /// Always fetch. Entities are merged for other queries, but the result
    /// itself is never stored.
    NoCache,
    /// Never fetch. A miss fails with [`Error::CacheMiss`](crate::Error::CacheMiss).
    CacheOnly,
}

impl FetchPolicy {
    /// Whether the cache is consulted before the network.
    pub fn reads_cache(self) -> bool {
        matches!(self, Self::CacheFirst | Self::CacheOnly)
    }

    /// Whether the query result is stored under its own name.
    pub fn stores_result(self) -> bool {
        matches!(self, Self::CacheFirst | Self::NetworkOnly)
    }
}

/// A named, reusable field selection.
///
/// `body` is the complete definition text, for example
/// `fragment JobDetail on Job { id title }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    name: String,
    body: String,
    spreads: Vec<String>,
}

impl Fragment {
    /// Create a fragment definition.
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        let spreads = scan_spreads(&body);
        Self {
            name: name.into(),
            body,
            spreads,
        }
    }

    /// The fragment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The definition text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Fragments spread by this fragment, in textual order.
    pub fn spreads(&self) -> &[String] {
        &self.spreads
    }
}

/// An immutable query or mutation definition.
///
/// The `name` is sent as `operationName`, so it must match the operation
/// name written inside `body`.
///
/// # Example
///
/// ```ignore
/// let op = Operation::query("JobQuery", r#"
///     query JobQuery($id: ID!) {
///         job(id: $id) { ...JobDetail }
///     }
/// "#);
/// assert_eq!(op.fragments(), ["JobDetail"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    name: String,
    kind: OperationKind,
    body: String,
    fragments: Vec<String>,
    fetch_policy: FetchPolicy,
}

impl Operation {
    /// Create a query definition with the default [`FetchPolicy::CacheFirst`].
    pub fn query(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Query, body)
    }

    /// Create a mutation definition.
    pub fn mutation(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Mutation, body)
    }

    fn new(name: impl Into<String>, kind: OperationKind, body: impl Into<String>) -> Self {
        let body = body.into();
        let fragments = scan_spreads(&body);
        Self {
            name: name.into(),
            kind,
            body,
            fragments,
            fetch_policy: FetchPolicy::default(),
        }
    }

    /// Set the fetch policy.
    ///
    /// Mutations always go to the network; the policy only affects queries.
    pub fn fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.fetch_policy = policy;
        self
    }

    /// The operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Query or mutation.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The operation text without fragment definitions.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Fragments spread directly by the body, deduplicated, in textual order.
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// The configured fetch policy.
    pub fn policy(&self) -> FetchPolicy {
        self.fetch_policy
    }
}

/// Collect the names of `...Name` fragment spreads in `text`.
///
/// Inline fragments (`... on Type`, `... @include(...)`) are skipped, as are
/// string literals and `#` comments. Names are returned once each, in order
/// of first appearance.
pub(crate) fn scan_spreads(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut names: Vec<String> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'.' if text[i..].starts_with("...") => {
                i += 3;
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let name = &text[start..i];
                if !name.is_empty() && name != "on" && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
            _ => i += 1,
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_named_spreads() {
        let spreads = scan_spreads("query { job { ...JobDetail company { ...CompanyFields } } }");
        assert_eq!(spreads, vec!["JobDetail", "CompanyFields"]);
    }

    #[test]
    fn test_scan_skips_inline_fragments() {
        let spreads =
            scan_spreads("{ node { ... on Job { id } ... @include(if: $x) { id } ...Named } }");
        assert_eq!(spreads, vec!["Named"]);
    }

    #[test]
    fn test_scan_deduplicates() {
        let spreads = scan_spreads("{ a { ...F } b { ... F } c { ...G } }");
        assert_eq!(spreads, vec!["F", "G"]);
    }

    #[test]
    fn test_scan_ignores_strings_and_comments() {
        let text = r#"
            # see ...Commented
            query { search(term: "...Quoted \"...Escaped\"") { ...Real } }
        "#;
        assert_eq!(scan_spreads(text), vec!["Real"]);
    }

    #[test]
    fn test_operation_kinds() {
        let query = Operation::query("Q", "query Q { a }");
        assert_eq!(query.kind(), OperationKind::Query);
        assert_eq!(query.policy(), FetchPolicy::CacheFirst);

        let mutation = Operation::mutation("M", "mutation M { a }");
        assert_eq!(mutation.kind(), OperationKind::Mutation);
    }

    #[test]
    fn test_fetch_policy_flags() {
        assert!(FetchPolicy::CacheFirst.reads_cache());
        assert!(FetchPolicy::CacheOnly.reads_cache());
        assert!(!FetchPolicy::NoCache.reads_cache());
        assert!(!FetchPolicy::NetworkOnly.reads_cache());

        assert!(FetchPolicy::NetworkOnly.stores_result());
        assert!(!FetchPolicy::NoCache.stores_result());
    }
}
