//! Operation registry.
//!
//! Holds the named queries, mutations and fragments a client may send, and
//! composes each operation's full request text: the operation body followed
//! by every fragment it transitively spreads, exactly once each.
//!
//! Definitions are validated when they are registered. A fragment may only
//! spread fragments that are already registered, so a registry that accepted
//! every definition can always compose and can never contain a cycle.
//!
//! # Example
//!
//! ```ignore
//! use joblink_graphql::registry::{Fragment, Operation, OperationRegistry};
//!
//! let mut registry = OperationRegistry::new();
//! registry.register_fragment(Fragment::new(
//!     "JobDetail",
//!     "fragment JobDetail on Job { id title }",
//! ))?;
//! registry.register_operation(Operation::query(
//!     "JobQuery",
//!     "query JobQuery($id: ID!) { job(id: $id) { ...JobDetail } }",
//! ))?;
//!
//! let text = registry.compose("JobQuery")?;
//! ```

mod operation;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub use operation::{FetchPolicy, Fragment, Operation, OperationKind};

use crate::error::{Error, Result};
use crate::logging::targets;

/// A registered operation together with its composed request text.
#[derive(Debug)]
struct Entry {
    operation: Arc<Operation>,
    text: String,
}

/// Registry of operations and fragments.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    fragments: HashMap<String, Arc<Fragment>>,
    operations: HashMap<String, Entry>,
}

impl OperationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fragment.
    ///
    /// Every fragment it spreads must already be registered.
    pub fn register_fragment(&mut self, fragment: Fragment) -> Result<()> {
        if self.fragments.contains_key(fragment.name()) {
            return Err(Error::DuplicateDefinition(fragment.name().to_string()));
        }
        if let Some(missing) = fragment
            .spreads()
            .iter()
            .find(|name| !self.fragments.contains_key(name.as_str()))
        {
            return Err(Error::unknown_fragment(fragment.name(), missing));
        }

        tracing::debug!(target: targets::REGISTRY, fragment = fragment.name(), "registered fragment");
        self.fragments
            .insert(fragment.name().to_string(), Arc::new(fragment));
        Ok(())
    }

    /// Register an operation and compose its request text.
    pub fn register_operation(&mut self, operation: Operation) -> Result<()> {
        if self.operations.contains_key(operation.name()) {
            return Err(Error::DuplicateDefinition(operation.name().to_string()));
        }

        let text = self.compose_text(&operation)?;
        tracing::debug!(
            target: targets::REGISTRY,
            operation = operation.name(),
            kind = %operation.kind(),
            "registered operation"
        );
        self.operations.insert(
            operation.name().to_string(),
            Entry {
                operation: Arc::new(operation),
                text,
            },
        );
        Ok(())
    }

    /// The full request text for an operation.
    pub fn compose(&self, name: &str) -> Result<String> {
        self.operations
            .get(name)
            .map(|entry| entry.text.clone())
            .ok_or_else(|| Error::UnknownOperation(name.to_string()))
    }

    /// Look up an operation definition.
    pub fn operation(&self, name: &str) -> Option<&Arc<Operation>> {
        self.operations.get(name).map(|entry| &entry.operation)
    }

    /// Look up a fragment definition.
    pub fn fragment(&self, name: &str) -> Option<&Arc<Fragment>> {
        self.fragments.get(name)
    }

    /// Number of registered operations.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Number of registered fragments.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Concatenate the operation body with each transitively spread
    /// fragment, depth first, in order of first reference.
    fn compose_text(&self, operation: &Operation) -> Result<String> {
        let mut order: Vec<&Fragment> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&str, &str)> = operation
            .fragments()
            .iter()
            .rev()
            .map(|name| (operation.name(), name.as_str()))
            .collect();

        while let Some((referrer, name)) = stack.pop() {
            if !seen.insert(name) {
                continue;
            }
            let fragment = self
                .fragments
                .get(name)
                .ok_or_else(|| Error::unknown_fragment(referrer, name))?;
            order.push(fragment);
            stack.extend(
                fragment
                    .spreads()
                    .iter()
                    .rev()
                    .map(|spread| (fragment.name(), spread.as_str())),
            );
        }

        let mut text = operation.body().trim().to_string();
        for fragment in order {
            text.push('\n');
            text.push_str(fragment.body().trim());
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(fragments: &[(&str, &str)]) -> OperationRegistry {
        let mut registry = OperationRegistry::new();
        for (name, body) in fragments {
            registry
                .register_fragment(Fragment::new(*name, *body))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_compose_appends_fragment() {
        let mut registry = registry_with(&[("F", "fragment F on T { id }")]);
        registry
            .register_operation(Operation::query("Q", "query Q { t { ...F } }"))
            .unwrap();

        assert_eq!(
            registry.compose("Q").unwrap(),
            "query Q { t { ...F } }\nfragment F on T { id }"
        );
    }

    #[test]
    fn test_compose_transitive_once_each() {
        let mut registry = registry_with(&[
            ("Leaf", "fragment Leaf on T { id }"),
            ("A", "fragment A on T { ...Leaf name }"),
            ("B", "fragment B on T { ...Leaf ...A }"),
        ]);
        registry
            .register_operation(Operation::query(
                "Q",
                "query Q { x { ...B } y { ...A } z { ...Leaf } }",
            ))
            .unwrap();

        let text = registry.compose("Q").unwrap();
        assert_eq!(text.matches("fragment Leaf on T").count(), 1);
        assert_eq!(text.matches("fragment A on T").count(), 1);
        assert_eq!(text.matches("fragment B on T").count(), 1);

        // Depth first from the body: B, then Leaf and A through B.
        let b = text.find("fragment B").unwrap();
        let leaf = text.find("fragment Leaf").unwrap();
        let a = text.find("fragment A").unwrap();
        assert!(b < leaf && leaf < a);
    }

    #[test]
    fn test_shared_fragment_across_operations() {
        let mut registry = registry_with(&[("F", "fragment F on T { id }")]);
        registry
            .register_operation(Operation::query("Q1", "query Q1 { a { ...F } }"))
            .unwrap();
        registry
            .register_operation(Operation::mutation("M1", "mutation M1 { b { ...F } }"))
            .unwrap();

        for name in ["Q1", "M1"] {
            let text = registry.compose(name).unwrap();
            assert_eq!(text.matches("fragment F on T").count(), 1);
        }
    }

    #[test]
    fn test_unknown_fragment_fails_at_registration() {
        let mut registry = OperationRegistry::new();
        let err = registry
            .register_operation(Operation::query("Q", "query Q { a { ...Missing } }"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownFragment { ref definition, ref fragment }
                if definition == "Q" && fragment == "Missing"
        ));
        assert!(registry.operation("Q").is_none());
    }

    #[test]
    fn test_fragment_must_follow_its_dependencies() {
        let mut registry = OperationRegistry::new();
        let err = registry
            .register_fragment(Fragment::new("A", "fragment A on T { ...B }"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFragment { .. }));

        // Self reference is rejected the same way.
        let err = registry
            .register_fragment(Fragment::new("C", "fragment C on T { ...C }"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFragment { .. }));
        assert_eq!(registry.fragment_count(), 0);
    }

    #[test]
    fn test_duplicate_definitions_rejected() {
        let mut registry = registry_with(&[("F", "fragment F on T { id }")]);
        assert!(matches!(
            registry.register_fragment(Fragment::new("F", "fragment F on T { name }")),
            Err(Error::DuplicateDefinition(_))
        ));

        registry
            .register_operation(Operation::query("Q", "query Q { a }"))
            .unwrap();
        assert!(matches!(
            registry.register_operation(Operation::query("Q", "query Q { b }")),
            Err(Error::DuplicateDefinition(_))
        ));
        assert_eq!(registry.compose("Q").unwrap(), "query Q { a }");
    }

    #[test]
    fn test_compose_unknown_operation() {
        let registry = OperationRegistry::new();
        assert!(matches!(
            registry.compose("Nope"),
            Err(Error::UnknownOperation(name)) if name == "Nope"
        ));
    }
}
