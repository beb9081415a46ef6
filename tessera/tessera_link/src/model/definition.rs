use serde_json::{Map, Value};
use tessera_core::deferred::{Deferred, Input};
use tessera_core::{resolve_properties, PropertyMap};

use super::capability::CapabilityDescriptor;

/// What a linkable node exposes to the resources it is linked to.
#[derive(Debug, Clone, Default)]
pub struct LinkDefinition {
    /// Values readable at runtime; constants or deferred outputs
    pub properties: PropertyMap,

    /// Permissions and bindings granted to the linking resource
    pub include: Vec<CapabilityDescriptor>,
}

impl LinkDefinition {
    /// A definition with properties and no capabilities.
    pub fn new(properties: PropertyMap) -> Self {
        Self {
            properties,
            include: Vec::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Input>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Builder-style capability setter.
    pub fn with_include(mut self, descriptor: CapabilityDescriptor) -> Self {
        self.include.push(descriptor);
        self
    }

    /// Resolve the properties into a JSON object.
    pub fn resolved_properties(&self) -> Deferred<Map<String, Value>> {
        resolve_properties(&self.properties)
    }

    /// Resolve the include list into its JSON form.
    pub fn resolved_include(&self) -> Deferred<Vec<Value>> {
        Deferred::combine(self.include.iter().map(CapabilityDescriptor::to_json).collect())
    }
}
