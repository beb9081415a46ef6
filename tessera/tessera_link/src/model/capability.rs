use serde_json::{Map, Value};
use tessera_core::deferred::{Deferred, Input};
use tessera_core::error::ReferenceError;
use tessera_core::{resolve_properties, PropertyMap};

/// Discriminant of permission descriptors
pub const PERMISSION: &str = "permission";

/// Discriminant of binding descriptors
pub const BINDING: &str = "binding";

/// An access permission granted to whatever links the owning resource
#[derive(Debug, Clone)]
pub struct Permission {
    /// Provider actions, e.g. `s3:GetObject`
    pub actions: Vec<String>,

    /// Resource identifiers the actions apply to; usually deferred ARNs
    pub resources: Vec<Input>,
}

/// A runtime binding, e.g. a KV namespace or queue attached to a worker
#[derive(Debug, Clone)]
pub struct Binding {
    /// Binding kind, e.g. `kv` or `queue`
    pub kind: String,

    /// Binding-specific properties
    pub properties: PropertyMap,
}

/// A typed capability fragment attached to a link definition.
///
/// The set of kinds is open: anything that is neither a permission nor a
/// binding is carried as [`CapabilityDescriptor::Other`] with its own
/// discriminant, and consumers filter by [`descriptor_type`](Self::descriptor_type).
#[derive(Debug, Clone)]
pub enum CapabilityDescriptor {
    /// `type: "permission"`
    Permission(Permission),

    /// `type: "binding"`
    Binding(Binding),

    /// Any other descriptor type
    Other {
        /// The `type` discriminant
        kind: String,
        /// Remaining fields
        fields: PropertyMap,
    },
}

impl CapabilityDescriptor {
    /// The `type` discriminant of this descriptor.
    pub fn descriptor_type(&self) -> &str {
        match self {
            Self::Permission(_) => PERMISSION,
            Self::Binding(_) => BINDING,
            Self::Other { kind, .. } => kind,
        }
    }

    /// The permission payload, if this is a permission.
    pub fn as_permission(&self) -> Option<&Permission> {
        match self {
            Self::Permission(permission) => Some(permission),
            _ => None,
        }
    }

    /// The binding payload, if this is a binding.
    pub fn as_binding(&self) -> Option<&Binding> {
        match self {
            Self::Binding(binding) => Some(binding),
            _ => None,
        }
    }

    /// JSON form `{type, ...fields}`, resolved once every deferred field is.
    pub fn to_json(&self) -> Deferred<Value> {
        match self {
            Self::Permission(permission) => {
                let actions = permission.actions.clone();
                let resources = permission.resources.iter().map(Input::to_deferred).collect();
                Deferred::combine(resources).map(move |resources| {
                    serde_json::json!({
                        "type": PERMISSION,
                        "actions": actions,
                        "resources": resources,
                    })
                })
            }
            Self::Binding(binding) => {
                let kind = binding.kind.clone();
                resolve_properties(&binding.properties).map(move |properties| {
                    serde_json::json!({
                        "type": BINDING,
                        "kind": kind,
                        "properties": properties,
                    })
                })
            }
            Self::Other { kind, fields } => {
                let kind = kind.clone();
                resolve_properties(fields).map(move |fields| {
                    let mut object = Map::new();
                    object.insert("type".to_string(), Value::String(kind));
                    object.extend(fields);
                    Value::Object(object)
                })
            }
        }
    }

    /// Parse the JSON form produced by [`to_json`](Self::to_json).
    pub fn from_json(value: &Value) -> Result<Self, ReferenceError> {
        let object = value
            .as_object()
            .ok_or_else(|| {
                ReferenceError::Malformed(format!("descriptor is not an object: {}", value))
            })?;
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ReferenceError::Malformed(format!("descriptor without type: {}", value))
            })?;

        match kind {
            PERMISSION => {
                let actions = string_list(object.get("actions")).ok_or_else(|| {
                    ReferenceError::Malformed("permission without actions".to_string())
                })?;
                let resources = object
                    .get("resources")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        ReferenceError::Malformed("permission without resources".to_string())
                    })?
                    .iter()
                    .cloned()
                    .map(Input::Known)
                    .collect();
                Ok(Self::Permission(Permission { actions, resources }))
            }
            BINDING => {
                let binding_kind = object
                    .get("kind")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ReferenceError::Malformed("binding without kind".to_string()))?;
                let properties = match object.get("properties") {
                    Some(Value::Object(map)) => known_map(map),
                    None => PropertyMap::new(),
                    Some(other) => {
                        return Err(ReferenceError::Malformed(format!(
                            "binding properties are not an object: {}",
                            other
                        )))
                    }
                };
                Ok(Self::Binding(Binding {
                    kind: binding_kind.to_string(),
                    properties,
                }))
            }
            other => {
                let mut fields = known_map(object);
                fields.shift_remove("type");
                Ok(Self::Other {
                    kind: other.to_string(),
                    fields,
                })
            }
        }
    }
}

/// Create a permission descriptor.
pub fn permission<A, R>(actions: A, resources: R) -> CapabilityDescriptor
where
    A: IntoIterator,
    A::Item: Into<String>,
    R: IntoIterator,
    R::Item: Into<Input>,
{
    CapabilityDescriptor::Permission(Permission {
        actions: actions.into_iter().map(Into::into).collect(),
        resources: resources.into_iter().map(Into::into).collect(),
    })
}

/// Create a binding descriptor.
pub fn binding(kind: impl Into<String>, properties: PropertyMap) -> CapabilityDescriptor {
    CapabilityDescriptor::Binding(Binding {
        kind: kind.into(),
        properties,
    })
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value?
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn known_map(map: &Map<String, Value>) -> PropertyMap {
    map.iter()
        .map(|(k, v)| (k.clone(), Input::Known(v.clone())))
        .collect()
}
