use dashmap::DashMap;
use tracing::debug;

use super::{PendingReference, ReferenceStore};

/// An in-memory implementation of the ReferenceStore trait
///
/// This store uses DashMap so a provisioning runtime evaluating subtrees
/// concurrently can read references while the session publishes them.
#[derive(Default)]
pub struct InMemoryReferenceStore {
    /// Map from exported name to reference
    references: DashMap<String, PendingReference>,
}

impl InMemoryReferenceStore {
    /// Creates a new empty in-memory reference store
    pub fn new() -> Self {
        Self {
            references: DashMap::new(),
        }
    }
}

impl ReferenceStore for InMemoryReferenceStore {
    fn publish(&self, reference: PendingReference) {
        debug!(
            name = %reference.exported_name,
            type_tag = %reference.type_tag,
            "Publishing reference"
        );
        self.references
            .insert(reference.exported_name.clone(), reference);
    }

    fn get(&self, exported_name: &str) -> Option<PendingReference> {
        self.references
            .get(exported_name)
            .map(|entry| entry.value().clone())
    }

    fn list(&self) -> Vec<PendingReference> {
        let mut references: Vec<PendingReference> = self
            .references
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        references.sort_by(|a, b| a.exported_name.cmp(&b.exported_name));
        references
    }

    fn len(&self) -> usize {
        self.references.len()
    }

    fn clear(&self) {
        self.references.clear();
    }
}
