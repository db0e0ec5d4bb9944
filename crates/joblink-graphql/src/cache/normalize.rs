//! Response normalization and re-materialization.
//!
//! A response is split into an entity table and a shape. Every object the
//! key function identifies becomes an entity and is replaced by a reference;
//! everything else stays inline. The selection records which fields the
//! response carried at each level, so a later read can rebuild the same
//! shape from whatever the entity table holds at that time.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use super::key::{EntityKey, KeyFn};

/// Field values of an entity or inline object.
pub(crate) type Fields = BTreeMap<String, Stored>;

/// A normalized value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stored {
    /// A scalar, or `null`.
    Value(Value),
    /// A reference into the entity table.
    Ref(EntityKey),
    List(Vec<Stored>),
    /// An object without identity, stored in place.
    Object(Fields),
}

/// The fields observed at each level of a response.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Selection {
    /// A scalar field, or a list of scalars.
    Leaf,
    /// An object field with these sub-fields.
    Fields(BTreeMap<String, Selection>),
}

impl Selection {
    /// Derive the selection a response value answers.
    ///
    /// List elements contribute the union of their fields.
    pub(crate) fn of(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::Fields(
                map.iter()
                    .map(|(name, value)| (name.clone(), Self::of(value)))
                    .collect(),
            ),
            Value::Array(items) => items
                .iter()
                .map(Self::of)
                .fold(Self::Leaf, Self::union),
            _ => Self::Leaf,
        }
    }

    fn union(self, other: Self) -> Self {
        match (self, other) {
            (Self::Leaf, other) | (other, Self::Leaf) => other,
            (Self::Fields(mut left), Self::Fields(right)) => {
                for (name, selection) in right {
                    let merged = match left.remove(&name) {
                        Some(existing) => existing.union(selection),
                        None => selection,
                    };
                    left.insert(name, merged);
                }
                Self::Fields(left)
            }
        }
    }
}

/// A response split into its shape and the entities it carried.
#[derive(Debug)]
pub(crate) struct Normalized {
    pub(crate) root: Stored,
    /// Entities in the order they were encountered. The same key may appear
    /// more than once; later occurrences win field by field.
    pub(crate) entities: Vec<(EntityKey, Fields)>,
}

pub(crate) fn normalize(value: &Value, key_fn: &KeyFn) -> Normalized {
    let mut entities = Vec::new();
    let root = walk(value, key_fn, &mut entities);
    Normalized { root, entities }
}

fn walk(value: &Value, key_fn: &KeyFn, entities: &mut Vec<(EntityKey, Fields)>) -> Stored {
    match value {
        Value::Object(map) => {
            let fields: Fields = map
                .iter()
                .map(|(name, value)| (name.clone(), walk(value, key_fn, entities)))
                .collect();
            match key_fn(map) {
                Some(key) => {
                    entities.push((key.clone(), fields));
                    Stored::Ref(key)
                }
                None => Stored::Object(fields),
            }
        }
        Value::Array(items) => {
            Stored::List(items.iter().map(|item| walk(item, key_fn, entities)).collect())
        }
        other => Stored::Value(other.clone()),
    }
}

/// Rebuild a value from the store.
///
/// Returns `None` when a selected field is missing or its stored form does
/// not match the selection.
pub(crate) fn materialize(
    stored: &Stored,
    selection: &Selection,
    entities: &HashMap<EntityKey, Fields>,
) -> Option<Value> {
    match (stored, selection) {
        (Stored::List(items), _) => items
            .iter()
            .map(|item| materialize(item, selection, entities))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        (Stored::Value(value), Selection::Leaf) => Some(value.clone()),
        (Stored::Value(Value::Null), Selection::Fields(_)) => Some(Value::Null),
        (Stored::Value(_), Selection::Fields(_)) => None,
        (Stored::Object(fields), Selection::Fields(selected)) => {
            select(fields, selected, entities)
        }
        (Stored::Ref(key), Selection::Fields(selected)) => {
            select(entities.get(key)?, selected, entities)
        }
        (Stored::Object(_) | Stored::Ref(_), Selection::Leaf) => None,
    }
}

fn select(
    fields: &Fields,
    selected: &BTreeMap<String, Selection>,
    entities: &HashMap<EntityKey, Fields>,
) -> Option<Value> {
    let mut object = Map::new();
    for (name, selection) in selected {
        let value = materialize(fields.get(name)?, selection, entities)?;
        object.insert(name.clone(), value);
    }
    Some(Value::Object(object))
}

/// Plain JSON view of a stored value. References render as `{"__ref": "Type:id"}`.
pub(crate) fn to_json(stored: &Stored) -> Value {
    match stored {
        Stored::Value(value) => value.clone(),
        Stored::Ref(key) => {
            let mut object = Map::new();
            object.insert("__ref".to_string(), Value::String(key.to_string()));
            Value::Object(object)
        }
        Stored::List(items) => Value::Array(items.iter().map(to_json).collect()),
        Stored::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), to_json(value)))
                .collect(),
        ),
    }
}
