//! Entity identity.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// The (type, id) identity of a normalized entity, displayed as `Type:id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    typename: String,
    id: String,
}

impl EntityKey {
    /// Create a key.
    pub fn new(typename: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            typename: typename.into(),
            id: id.into(),
        }
    }

    /// The GraphQL type name.
    pub fn typename(&self) -> &str {
        &self.typename
    }

    /// The identifier within the type.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.typename, self.id)
    }
}

/// Maps a response object to its entity identity, or `None` for objects
/// that are not entities.
pub type KeyFn = Arc<dyn Fn(&Map<String, Value>) -> Option<EntityKey> + Send + Sync>;

/// Identify objects by their `__typename` and `id` fields.
///
/// `id` may be a string or a number.
pub fn default_key(object: &Map<String, Value>) -> Option<EntityKey> {
    let typename = object.get("__typename")?.as_str()?;
    let id = match object.get("id")? {
        Value::String(id) => id.clone(),
        Value::Number(id) => id.to_string(),
        _ => return None,
    };
    Some(EntityKey::new(typename, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key_of(value: Value) -> Option<EntityKey> {
        default_key(value.as_object().unwrap())
    }

    #[test]
    fn test_default_key() {
        assert_eq!(
            key_of(json!({"__typename": "Job", "id": "42", "title": "x"})),
            Some(EntityKey::new("Job", "42"))
        );
        assert_eq!(
            key_of(json!({"__typename": "Company", "id": 7})).unwrap().to_string(),
            "Company:7"
        );
    }

    #[test]
    fn test_objects_without_identity() {
        assert_eq!(key_of(json!({"id": "42"})), None);
        assert_eq!(key_of(json!({"__typename": "Job"})), None);
        assert_eq!(key_of(json!({"__typename": "Job", "id": null})), None);
    }
}
