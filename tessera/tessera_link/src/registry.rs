//! Exported-name uniqueness.
//!
//! Top-level linkables are exported under their logical name, so two of
//! them differing only in case would collide at runtime. `app` is reserved
//! for the `RESOURCE_App` entry.

use std::collections::HashSet;

use tracing::debug;

use tessera_core::error::LinkError;

/// The name reserved for the app-level entry (case-insensitive).
pub const RESERVED_NAME: &str = "app";

/// Tracks the exported names claimed during one synthesis run.
#[derive(Debug, Default)]
pub struct ExportedNameRegistry {
    names: HashSet<String>,
}

impl ExportedNameRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim an exported name.
    pub fn register(&mut self, name: &str) -> Result<(), LinkError> {
        let key = name.to_lowercase();
        if key == RESERVED_NAME {
            return Err(LinkError::ReservedName(name.to_string()));
        }
        if !self.names.insert(key) {
            return Err(LinkError::DuplicateName(name.to_string()));
        }
        debug!(name, "Registered exported name");
        Ok(())
    }

    /// Whether a name (any case) has been claimed.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    /// Number of claimed names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no name has been claimed.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Forget every claimed name.
    pub fn clear(&mut self) {
        self.names.clear();
    }
}
