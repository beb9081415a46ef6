//! Cross-deployment reference resolution.
//!
//! A deployment can link against resources that another deployment of the
//! same app created, by reading the reference records that deployment
//! published. The resolved handle is read-only: it exposes the recorded
//! properties and capability descriptors and never triggers resource
//! creation.

use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use tessera_core::error::{Error, ReferenceError};
use tessera_core::id::Urn;
use tessera_core::{AppContext, Input};

use crate::linkable::Linkable;
use crate::model::{CapabilityDescriptor, LinkDefinition};
use crate::store::{parse_records, ReferenceRecord};

/// A read-only handle to a resource published by another deployment.
#[derive(Debug, Clone)]
pub struct LinkRef {
    urn: Urn,
    definition: LinkDefinition,
}

impl LinkRef {
    /// Reconstruct a handle from a record published under `app`.
    pub fn from_record(app: &AppContext, record: &ReferenceRecord) -> Result<Self, ReferenceError> {
        let include = record
            .include
            .iter()
            .map(CapabilityDescriptor::from_json)
            .collect::<Result<Vec<_>, _>>()?;
        let properties = record
            .properties
            .iter()
            .map(|(key, value)| (key.clone(), Input::Known(value.clone())))
            .collect();

        Ok(Self {
            urn: Urn::new(
                app.stage.clone(),
                app.name.clone(),
                record.type_tag.clone(),
                record.exported_name.clone(),
            ),
            definition: LinkDefinition {
                properties,
                include,
            },
        })
    }
}

impl Linkable for LinkRef {
    fn urn(&self) -> &Urn {
        &self.urn
    }

    fn link(&self) -> anyhow::Result<LinkDefinition> {
        Ok(self.definition.clone())
    }
}

/// Looks up references published by a foreign deployment.
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    app: AppContext,
    records: IndexMap<String, ReferenceRecord>,
}

impl ReferenceResolver {
    /// Create a resolver over records published by `app`.
    pub fn from_records(
        app: AppContext,
        records: impl IntoIterator<Item = ReferenceRecord>,
    ) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.exported_name.clone(), record))
            .collect();
        Self { app, records }
    }

    /// Create a resolver from the JSON array form of the records.
    pub fn from_json(app: AppContext, json: &str) -> Result<Self, ReferenceError> {
        Ok(Self::from_records(app, parse_records(json)?))
    }

    /// Create a resolver from a file written by
    /// [`write_records`](crate::store::write_records).
    pub async fn from_path(app: AppContext, path: impl AsRef<Path>) -> Result<Self, Error> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(Self::from_json(app, &content)?)
    }

    /// Reconstruct the handle published under `exported_name`.
    pub fn get(&self, exported_name: &str) -> Result<LinkRef, ReferenceError> {
        let record = self
            .records
            .get(exported_name)
            .ok_or_else(|| ReferenceError::NotFound(exported_name.to_string()))?;
        debug!(
            name = exported_name,
            app = %self.app.name,
            stage = %self.app.stage,
            "Resolved reference"
        );
        LinkRef::from_record(&self.app, record)
    }

    /// Exported names available, in publication order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records_json() -> String {
        json!([
            {
                "exportedName": "Photos",
                "typeTag": "tessera:aws:Bucket",
                "properties": {"name": "shop-prod-photos"},
                "include": [
                    {
                        "type": "permission",
                        "actions": ["s3:*"],
                        "resources": ["arn:aws:s3:::shop-prod-photos"]
                    }
                ]
            }
        ])
        .to_string()
    }

    #[test]
    fn test_get_reconstructs_definition() {
        let resolver =
            ReferenceResolver::from_json(AppContext::new("shop", "prod"), &records_json()).unwrap();
        let photos = resolver.get("Photos").unwrap();

        assert_eq!(photos.exported_name(), "Photos");
        assert_eq!(photos.type_tag(), "tessera:aws:Bucket");
        assert_eq!(photos.urn().stage(), "prod");

        let definition = photos.link().unwrap();
        assert_eq!(definition.properties["name"].peek(), Some(json!("shop-prod-photos")));
        let permission = definition.include[0].as_permission().unwrap();
        assert_eq!(permission.actions, vec!["s3:*".to_string()]);
    }

    #[test]
    fn test_missing_name() {
        let resolver =
            ReferenceResolver::from_json(AppContext::new("shop", "prod"), &records_json()).unwrap();
        assert_eq!(
            resolver.get("Videos").unwrap_err(),
            ReferenceError::NotFound("Videos".to_string())
        );
        assert_eq!(resolver.names().collect::<Vec<_>>(), vec!["Photos"]);
    }

    #[test]
    fn test_malformed_include_is_reported() {
        let json = json!([{
            "exportedName": "Bad",
            "typeTag": "tessera:aws:Bucket",
            "properties": {},
            "include": [{"actions": []}]
        }])
        .to_string();
        let resolver =
            ReferenceResolver::from_json(AppContext::new("shop", "prod"), &json).unwrap();
        assert!(matches!(resolver.get("Bad"), Err(ReferenceError::Malformed(_))));
    }
}
