//! The linkable protocol.
//!
//! Any node in the tree can be linked to a compute resource as long as it
//! can produce a [`LinkDefinition`]. The exported name under which its
//! properties show up at runtime is the last segment of the node's URN.

use std::fmt;
use std::sync::Arc;

use tessera_core::error::LinkError;
use tessera_core::id::Urn;

use crate::model::LinkDefinition;

/// A node that exposes a property bag and capability descriptors.
pub trait Linkable: Send + Sync {
    /// Stable identity of the node.
    fn urn(&self) -> &Urn;

    /// Produce the link definition.
    ///
    /// May fail when the node's own child resources are not ready; callers
    /// decide whether that is fatal.
    fn link(&self) -> anyhow::Result<LinkDefinition>;

    /// Name the node is exported under.
    fn exported_name(&self) -> &str {
        self.urn().name()
    }

    /// Type tag of the node.
    fn type_tag(&self) -> &str {
        self.urn().type_tag()
    }
}

impl fmt::Debug for dyn Linkable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Linkable").field("urn", &self.urn().to_string()).finish()
    }
}

/// Any node that may or may not be linkable.
pub trait LinkSource {
    /// Name used when the node is rejected from a `link` list.
    fn source_name(&self) -> &str;

    /// The linkable view of this node, if it has one.
    fn as_linkable(&self) -> Option<Arc<dyn Linkable>>;
}

impl LinkSource for Arc<dyn Linkable> {
    fn source_name(&self) -> &str {
        self.exported_name()
    }

    fn as_linkable(&self) -> Option<Arc<dyn Linkable>> {
        Some(self.clone())
    }
}

/// Whether the node can be used in a `link` list.
pub fn is_linkable(node: &dyn LinkSource) -> bool {
    node.as_linkable().is_some()
}

/// Turn a user-supplied `link` list into linkables, keeping its order.
pub fn collect_links(nodes: &[&dyn LinkSource]) -> Result<Vec<Arc<dyn Linkable>>, LinkError> {
    nodes
        .iter()
        .map(|node| {
            node.as_linkable()
                .ok_or_else(|| LinkError::NotLinkable(node.source_name().to_string()))
        })
        .collect()
}

/// A linkable with a fixed definition.
#[derive(Debug, Clone)]
pub struct StaticLinkable {
    urn: Urn,
    definition: LinkDefinition,
}

impl StaticLinkable {
    /// Create a linkable node from a definition.
    pub fn new(urn: Urn, definition: LinkDefinition) -> Self {
        Self { urn, definition }
    }

    /// The definition this node was created with.
    pub fn definition(&self) -> &LinkDefinition {
        &self.definition
    }
}

impl Linkable for StaticLinkable {
    fn urn(&self) -> &Urn {
        &self.urn
    }

    fn link(&self) -> anyhow::Result<LinkDefinition> {
        Ok(self.definition.clone())
    }
}
