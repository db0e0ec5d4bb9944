//! Normalized result cache.
//!
//! Responses are normalized into an entity table keyed by [`EntityKey`] and
//! a per-query root shape keyed by operation name and variables. Reading a
//! query rebuilds its result from the current entity table, so an entity
//! updated by a mutation is seen by every query that references it.
//!
//! A read returns [`CacheLookup::Miss`] whenever any field the query
//! selected is unknown; partial objects are never returned.
//!
//! # Concurrency
//!
//! Both tables live behind one `RwLock`. A write applies every entity of a
//! response and its root shape under a single write lock, and a read
//! rebuilds its result under a single read lock, so a read racing a write
//! sees either all of it or none of it.
//!
//! # Example
//!
//! ```ignore
//! use joblink_graphql::cache::{CacheLookup, EntityKey, ResultCache};
//!
//! let cache = ResultCache::new();
//! cache.write_query("JobQuery", &json!({"id": "1"}), &json!({
//!     "job": {"__typename": "Job", "id": "1", "title": "Engineer"}
//! }));
//!
//! assert!(cache.contains(&EntityKey::new("Job", "1")));
//! assert!(matches!(cache.read("JobQuery", &json!({"id": "1"})), CacheLookup::Hit(_)));
//! ```

mod key;
mod normalize;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

pub use key::{EntityKey, KeyFn, default_key};

use self::normalize::{Fields, Selection, Stored, materialize, normalize, to_json};
use crate::logging::targets;
use crate::transport::normalize_variables;

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Every selected field was known; the rebuilt result.
    Hit(Value),
    /// The result must be fetched.
    Miss,
}

impl CacheLookup {
    /// Whether this is a hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    /// The cached value, if any.
    pub fn into_option(self) -> Option<Value> {
        match self {
            Self::Hit(value) => Some(value),
            Self::Miss => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RootKey {
    operation: String,
    variables: String,
}

impl RootKey {
    fn new(operation: &str, variables: &Value) -> Self {
        let mut canonical = String::new();
        write_canonical(&normalize_variables(variables.clone()), &mut canonical);
        Self {
            operation: operation.to_string(),
            variables: canonical,
        }
    }
}

/// Compact JSON with object keys sorted at every level, independent of the
/// map order serde_json was built with.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (name, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(value, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[derive(Debug)]
struct Root {
    value: Stored,
    selection: Selection,
}

#[derive(Debug, Default)]
struct Store {
    entities: HashMap<EntityKey, Fields>,
    roots: HashMap<RootKey, Root>,
}

impl Store {
    fn merge_entities(&mut self, entities: Vec<(EntityKey, Fields)>) {
        for (key, fields) in entities {
            self.entities.entry(key).or_default().extend(fields);
        }
    }
}

/// In-memory normalized cache shared by every query of a client.
pub struct ResultCache {
    store: RwLock<Store>,
    key_fn: KeyFn,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCache {
    /// Create an empty cache identifying entities by `__typename` and `id`.
    pub fn new() -> Self {
        Self::with_key_fn(default_key)
    }

    /// Create an empty cache with a custom identity function.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // Companies are identified by their slug.
    /// let cache = ResultCache::with_key_fn(|object| {
    ///     match object.get("__typename")?.as_str()? {
    ///         "Company" => Some(EntityKey::new("Company", object.get("slug")?.as_str()?)),
    ///         _ => default_key(object),
    ///     }
    /// });
    /// ```
    pub fn with_key_fn(
        key_fn: impl Fn(&Map<String, Value>) -> Option<EntityKey> + Send + Sync + 'static,
    ) -> Self {
        Self {
            store: RwLock::new(Store::default()),
            key_fn: Arc::new(key_fn),
        }
    }

    /// Answer a query from the cache.
    pub fn read(&self, operation: &str, variables: &Value) -> CacheLookup {
        let key = RootKey::new(operation, variables);
        let store = self.store.read();

        let Some(root) = store.roots.get(&key) else {
            tracing::trace!(target: targets::CACHE, operation, "miss: never stored");
            return CacheLookup::Miss;
        };

        match materialize(&root.value, &root.selection, &store.entities) {
            Some(value) => {
                tracing::trace!(target: targets::CACHE, operation, "hit");
                CacheLookup::Hit(value)
            }
            None => {
                tracing::trace!(target: targets::CACHE, operation, "miss: incomplete entities");
                CacheLookup::Miss
            }
        }
    }

    /// Store a query result so later reads of the same operation and
    /// variables can be answered locally. Entities it carries are merged.
    ///
    /// This is also how a mutation updater seeds a related query.
    pub fn write_query(&self, operation: &str, variables: &Value, data: &Value) {
        let key = RootKey::new(operation, variables);
        let normalized = normalize(data, &self.key_fn);
        let selection = Selection::of(data);
        let count = normalized.entities.len();

        let mut store = self.store.write();
        store.merge_entities(normalized.entities);
        store.roots.insert(
            key,
            Root {
                value: normalized.root,
                selection,
            },
        );
        drop(store);

        tracing::debug!(target: targets::CACHE, operation, entities = count, "stored query result");
    }

    /// Merge the entities in `data` without storing a query result.
    pub fn merge(&self, data: &Value) {
        let normalized = normalize(data, &self.key_fn);
        let count = normalized.entities.len();
        self.store.write().merge_entities(normalized.entities);
        tracing::debug!(target: targets::CACHE, entities = count, "merged entities");
    }

    /// Merge a mutation result, then hand the cache and the data to
    /// `updater` for any additional writes.
    pub fn write<F>(&self, data: &Value, updater: F)
    where
        F: FnOnce(&ResultCache, &Value),
    {
        self.merge(data);
        updater(self, data);
    }

    /// A plain JSON view of one entity, with references rendered as
    /// `{"__ref": "Type:id"}`.
    pub fn entity(&self, key: &EntityKey) -> Option<Value> {
        let store = self.store.read();
        let fields = store.entities.get(key)?;
        Some(Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), to_json(value)))
                .collect(),
        ))
    }

    /// Whether an entity is cached.
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.store.read().entities.contains_key(key)
    }

    /// Remove an entity. Queries referencing it miss until refetched.
    pub fn evict(&self, key: &EntityKey) -> bool {
        let removed = self.store.write().entities.remove(key).is_some();
        if removed {
            tracing::debug!(target: targets::CACHE, entity = %key, "evicted entity");
        }
        removed
    }

    /// Forget a stored query result.
    pub fn evict_query(&self, operation: &str, variables: &Value) -> bool {
        let key = RootKey::new(operation, variables);
        self.store.write().roots.remove(&key).is_some()
    }

    /// Remove everything.
    pub fn clear(&self) {
        let mut store = self.store.write();
        store.entities.clear();
        store.roots.clear();
    }

    /// Number of cached entities.
    pub fn len(&self) -> usize {
        self.store.read().entities.len()
    }

    /// Whether no entities are cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.store.read();
        f.debug_struct("ResultCache")
            .field("entities", &store.entities.len())
            .field("queries", &store.roots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job_detail(id: &str, title: &str) -> Value {
        json!({
            "job": {
                "__typename": "Job",
                "id": id,
                "title": title,
                "description": "Builds things",
                "company": {"__typename": "Company", "id": "c1", "name": "Acme"}
            }
        })
    }

    #[test]
    fn test_read_after_write() {
        let cache = ResultCache::new();
        let vars = json!({"id": "1"});
        assert_eq!(cache.read("JobQuery", &vars), CacheLookup::Miss);

        cache.write_query("JobQuery", &vars, &job_detail("1", "Engineer"));
        assert_eq!(
            cache.read("JobQuery", &vars),
            CacheLookup::Hit(job_detail("1", "Engineer"))
        );
        assert_eq!(cache.len(), 2);

        // Other variables are a different query.
        assert_eq!(cache.read("JobQuery", &json!({"id": "2"})), CacheLookup::Miss);
    }

    #[test]
    fn test_null_and_empty_variables_are_equal() {
        let cache = ResultCache::new();
        cache.write_query("Jobs", &Value::Null, &json!({"count": 1}));
        assert!(cache.read("Jobs", &json!({})).is_hit());
    }

    #[test]
    fn test_variable_order_does_not_matter() {
        let cache = ResultCache::new();
        let a: Value = serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();
        cache.write_query("Q", &a, &json!({"x": 1}));
        assert!(cache.read("Q", &b).is_hit());
    }

    #[test]
    fn test_root_key_sorts_nested_objects() {
        let mut a = Map::new();
        a.insert("z".into(), json!([{"b": 2, "a": 1}]));
        a.insert("id".into(), json!("1"));
        let mut b = Map::new();
        b.insert("id".into(), json!("1"));
        b.insert("z".into(), json!([{"a": 1, "b": 2}]));

        let key = RootKey::new("Q", &Value::Object(a));
        assert_eq!(key, RootKey::new("Q", &Value::Object(b)));
        assert_eq!(key.variables, r#"{"id":"1","z":[{"a":1,"b":2}]}"#);
        assert_ne!(key, RootKey::new("Q", &json!({"id": "1", "z": [{"a": 1}]})));
    }

    #[test]
    fn test_entity_update_visible_to_other_queries() {
        let cache = ResultCache::new();
        let vars = json!({"id": "1"});
        cache.write_query("JobQuery", &vars, &job_detail("1", "Engineer"));

        cache.merge(&json!({
            "updateJob": {"__typename": "Job", "id": "1", "title": "Senior Engineer"}
        }));

        let hit = cache.read("JobQuery", &vars).into_option().unwrap();
        assert_eq!(hit["job"]["title"], "Senior Engineer");
        assert_eq!(hit["job"]["description"], "Builds things");
    }

    #[test]
    fn test_partially_known_entity_is_miss() {
        let cache = ResultCache::new();
        cache.write_query("JobQuery", &json!({"id": "1"}), &job_detail("1", "Engineer"));

        // The company entity only has id and name; a query that selected the
        // company description cannot be answered.
        cache.write_query(
            "CompanyQuery",
            &json!({"id": "c1"}),
            &json!({"company": {"__typename": "Company", "id": "c1", "name": "Acme", "description": "Tools"}}),
        );
        cache.evict(&EntityKey::new("Company", "c1"));
        cache.merge(&json!({"company": {"__typename": "Company", "id": "c1", "name": "Acme"}}));

        assert_eq!(cache.read("CompanyQuery", &json!({"id": "c1"})), CacheLookup::Miss);
        assert!(cache.read("JobQuery", &json!({"id": "1"})).is_hit());
    }

    #[test]
    fn test_evicted_entity_is_miss() {
        let cache = ResultCache::new();
        let vars = json!({"id": "1"});
        cache.write_query("JobQuery", &vars, &job_detail("1", "Engineer"));

        assert!(cache.evict(&EntityKey::new("Job", "1")));
        assert!(!cache.evict(&EntityKey::new("Job", "1")));
        assert_eq!(cache.read("JobQuery", &vars), CacheLookup::Miss);
    }

    #[test]
    fn test_write_invokes_updater() {
        let cache = ResultCache::new();
        let data = json!({"job": {"__typename": "Job", "id": "42", "title": "Engineer"}});

        cache.write(&data, |cache, data| {
            let id = data["job"]["id"].clone();
            cache.write_query("JobQuery", &json!({ "id": id }), data);
        });

        assert!(cache.contains(&EntityKey::new("Job", "42")));
        assert_eq!(cache.read("JobQuery", &json!({"id": "42"})), CacheLookup::Hit(data));
    }

    #[test]
    fn test_entity_view_renders_refs() {
        let cache = ResultCache::new();
        cache.merge(&job_detail("1", "Engineer"));

        let job = cache.entity(&EntityKey::new("Job", "1")).unwrap();
        assert_eq!(job["title"], "Engineer");
        assert_eq!(job["company"], json!({"__ref": "Company:c1"}));
        assert!(cache.entity(&EntityKey::new("Job", "2")).is_none());
    }

    #[test]
    fn test_custom_key_fn() {
        let cache = ResultCache::with_key_fn(|object| {
            let slug = object.get("slug")?.as_str()?;
            Some(EntityKey::new("Company", slug))
        });
        cache.merge(&json!({"company": {"slug": "acme", "name": "Acme"}}));
        assert!(cache.contains(&EntityKey::new("Company", "acme")));
    }

    #[test]
    fn test_clear() {
        let cache = ResultCache::new();
        let vars = json!({"id": "1"});
        cache.write_query("JobQuery", &vars, &job_detail("1", "Engineer"));
        assert!(cache.evict_query("JobQuery", &vars));
        assert_eq!(cache.read("JobQuery", &vars), CacheLookup::Miss);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_merges_keep_one_entry() {
        let cache = ResultCache::new();
        std::thread::scope(|scope| {
            for writer in 0..8 {
                let cache = &cache;
                scope.spawn(move || {
                    for round in 0..50 {
                        let title = format!("w{writer}-r{round}");
                        cache.merge(&json!({
                            "job": {"__typename": "Job", "id": "1", "title": title, "writer": writer}
                        }));
                    }
                });
            }
        });

        assert_eq!(cache.len(), 1);
        let job = cache.entity(&EntityKey::new("Job", "1")).unwrap();
        // Fields of one write land together.
        let writer = job["writer"].as_u64().unwrap();
        assert!(job["title"].as_str().unwrap().starts_with(&format!("w{writer}-")));
    }
}
