//! Environment bindings for linked resources.
//!
//! Compute resources receive one environment variable per linked node,
//! `RESOURCE_{exportedName}`, holding the JSON-encoded properties of that
//! node plus its type tag, and a constant `RESOURCE_App` entry with the app
//! and stage names.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use tessera_core::deferred::Deferred;
use tessera_core::error::LinkError;
use tessera_core::AppContext;

use crate::linkable::Linkable;

/// Prefix of every link environment variable.
pub const ENV_PREFIX: &str = "RESOURCE_";

/// Key of the app-level entry.
pub const APP_ENV_KEY: &str = "RESOURCE_App";

/// The runtime view of one linked node.
#[derive(Debug, Clone)]
pub struct LinkData {
    /// Exported name
    pub name: String,

    /// Properties with the `type` field added
    pub properties: Deferred<Map<String, Value>>,
}

/// Collect the runtime view of every linked node, in the given order.
///
/// A node that fails to produce its definition is an error here: the
/// linking resource cannot be configured without it.
pub fn build_link_data(links: &[Arc<dyn Linkable>]) -> Result<Vec<LinkData>, LinkError> {
    links
        .iter()
        .map(|link| {
            let name = link.exported_name().to_string();
            let definition = link.link().map_err(|e| LinkError::DefinitionFailed {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            let type_tag = link.type_tag().to_string();
            let properties = definition.resolved_properties().map(move |mut properties| {
                properties.insert("type".to_string(), Value::String(type_tag));
                properties
            });
            Ok(LinkData { name, properties })
        })
        .collect()
}

/// Build the environment variables injected into a compute resource.
///
/// Entries follow the order of `links`, after the `RESOURCE_App` entry.
/// Values are deferred because linked properties usually are. Two links
/// exporting the same name are rejected rather than overwritten.
pub fn build_environment(
    app: &AppContext,
    links: &[Arc<dyn Linkable>],
) -> Result<IndexMap<String, Deferred<String>>, LinkError> {
    let mut environment = IndexMap::new();
    environment.insert(
        APP_ENV_KEY.to_string(),
        Deferred::known(app.to_json().to_string()),
    );

    for data in build_link_data(links)? {
        debug!(name = %data.name, "Adding link to environment");
        let value = data
            .properties
            .map(|properties| Value::Object(properties).to_string());
        let key = format!("{}{}", ENV_PREFIX, data.name);
        if key == APP_ENV_KEY {
            return Err(LinkError::ReservedName(data.name));
        }
        if environment.contains_key(&key) {
            return Err(LinkError::DuplicateName(data.name));
        }
        environment.insert(key, value);
    }

    Ok(environment)
}
