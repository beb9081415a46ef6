//! Reference records.
//!
//! After a run, every top-level linkable is published as a
//! [`ReferenceRecord`]: a durable, minimal description of its exported name,
//! type, properties and capability descriptors. Other deployments read these
//! records to link against resources they did not create. The serialized
//! shape is a compatibility contract and must not change.

mod in_memory;

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tessera_core::deferred::Deferred;
use tessera_core::error::{Error, ReferenceError};

use crate::linkable::Linkable;

/// The persisted description of a top-level linkable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRecord {
    /// Exported name of the node
    pub exported_name: String,

    /// Type tag of the node
    pub type_tag: String,

    /// Resolved properties
    pub properties: Map<String, Value>,

    /// Capability descriptors in their JSON form
    pub include: Vec<Value>,
}

/// A reference whose properties may still be resolving.
#[derive(Debug, Clone)]
pub struct PendingReference {
    /// Exported name of the node
    pub exported_name: String,

    /// Type tag of the node
    pub type_tag: String,

    /// The record, available once every deferred property is
    pub record: Deferred<ReferenceRecord>,
}

impl PendingReference {
    /// Capture a linkable's definition.
    ///
    /// Fails when the node cannot produce its definition yet; publication is
    /// best-effort, so callers skip the node in that case.
    pub fn capture(linkable: &dyn Linkable) -> anyhow::Result<Self> {
        let definition = linkable.link()?;
        let exported_name = linkable.exported_name().to_string();
        let type_tag = linkable.type_tag().to_string();

        let record = {
            let exported_name = exported_name.clone();
            let type_tag = type_tag.clone();
            definition
                .resolved_properties()
                .zip(&definition.resolved_include())
                .map(move |(properties, include)| ReferenceRecord {
                    exported_name,
                    type_tag,
                    properties,
                    include,
                })
        };

        Ok(Self {
            exported_name,
            type_tag,
            record,
        })
    }
}

/// Where published references are kept for the duration of a run.
pub trait ReferenceStore: Send + Sync {
    /// Publish a reference, replacing any previous one with the same name.
    fn publish(&self, reference: PendingReference);

    /// Look up a reference by exported name.
    fn get(&self, exported_name: &str) -> Option<PendingReference>;

    /// All references, ordered by exported name.
    fn list(&self) -> Vec<PendingReference>;

    /// Number of published references.
    fn len(&self) -> usize;

    /// Whether nothing has been published.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every reference.
    fn clear(&self);
}

/// Wait for every published reference to resolve.
pub async fn export_records(store: &dyn ReferenceStore) -> Vec<ReferenceRecord> {
    let pending = store.list().into_iter().map(|r| r.record).collect();
    Deferred::combine(pending).resolve().await
}

/// Persist records as a JSON array.
pub async fn write_records(
    path: impl AsRef<Path>,
    records: &[ReferenceRecord],
) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(records)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Parse records from their JSON array form.
pub fn parse_records(json: &str) -> Result<Vec<ReferenceRecord>, ReferenceError> {
    serde_json::from_str(json).map_err(|e| ReferenceError::Malformed(e.to_string()))
}

pub use in_memory::InMemoryReferenceStore;
