//! Construction arguments and resource options.
//!
//! [`Args`] is the insertion-ordered property bag handed to component and
//! provider-resource constructors. Insertion order is preserved so that
//! anything derived from it (environment payloads, reference records) is
//! deterministic.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::deferred::{Deferred, Input};
use crate::id::Urn;

/// An ordered map of property names to inputs.
pub type PropertyMap = IndexMap<String, Input>;

/// Construction arguments for a component or provider resource.
#[derive(Clone, Debug, Default)]
pub struct Args {
    values: PropertyMap,
}

impl Args {
    /// Create an empty argument bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build arguments from a JSON object. Non-object values yield an empty bag.
    pub fn from_json(value: Value) -> Self {
        let values = match value {
            Value::Object(map) => map.into_iter().map(|(k, v)| (k, Input::Known(v))).collect(),
            _ => PropertyMap::new(),
        };
        Self { values }
    }

    /// Builder-style setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Input>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a property, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Input>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get a property.
    pub fn get(&self, key: &str) -> Option<&Input> {
        self.values.get(key)
    }

    /// Remove a property.
    pub fn remove(&mut self, key: &str) -> Option<Input> {
        self.values.shift_remove(key)
    }

    /// Whether a property is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Whether a property is absent, null or an empty string.
    pub fn is_unset(&self, key: &str) -> bool {
        self.values.get(key).map_or(true, Input::is_unset)
    }

    /// Shallow merge: every key of `other` overwrites the same key here.
    pub fn merge(&mut self, other: &Args) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Input)> {
        self.values.iter()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &PropertyMap {
        &self.values
    }

    /// Resolve every property into a JSON object.
    pub fn to_object(&self) -> Deferred<Map<String, Value>> {
        resolve_properties(&self.values)
    }
}

impl From<PropertyMap> for Args {
    fn from(values: PropertyMap) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, Input)> for Args {
    fn from_iter<I: IntoIterator<Item = (String, Input)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Combine a property map into one deferred JSON object, preserving order.
pub fn resolve_properties(properties: &PropertyMap) -> Deferred<Map<String, Value>> {
    let keys: Vec<String> = properties.keys().cloned().collect();
    let values = properties.values().map(Input::to_deferred).collect();
    Deferred::combine(values).map(move |resolved| keys.into_iter().zip(resolved).collect())
}

/// Options attached to a resource registration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceOptions {
    /// The owning node
    pub parent: Option<Urn>,

    /// Keep the cloud resource when it is removed from the program
    pub retain_on_delete: Option<bool>,

    /// Delete the old resource before creating its replacement
    pub delete_before_replace: Option<bool>,

    /// Refuse deletion
    pub protect: bool,

    /// Explicit ordering dependencies
    pub depends_on: Vec<Urn>,
}

impl ResourceOptions {
    /// Options with the given parent.
    pub fn with_parent(parent: Urn) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }
}
