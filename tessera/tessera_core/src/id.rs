//! Identifiers for nodes and synthesis runs.
//!
//! Every node in the component tree is addressed by a [`Urn`], a stable
//! identity of the form `urn:tessera:{stage}::{app}::{type}::{name}`. The last
//! segment is the node's exported name, the segment before it is its type tag.
//!
//! # Examples
//!
//! ```
//! use tessera_core::id::Urn;
//! use std::str::FromStr;
//!
//! let urn = Urn::new("dev", "myapp", "tessera:aws:Bucket", "MyBucket");
//! assert_eq!(urn.name(), "MyBucket");
//! assert_eq!(urn.type_tag(), "tessera:aws:Bucket");
//!
//! let parsed = Urn::from_str(&urn.to_string()).unwrap();
//! assert_eq!(parsed, urn);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::NamingError;

const URN_PREFIX: &str = "urn:tessera:";
const SEPARATOR: &str = "::";

/// Stable identity of a node in the component tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Urn {
    stage: String,
    app: String,
    type_tag: String,
    name: String,
}

impl Urn {
    /// Create a URN from its parts.
    pub fn new(
        stage: impl Into<String>,
        app: impl Into<String>,
        type_tag: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            app: app.into(),
            type_tag: type_tag.into(),
            name: name.into(),
        }
    }

    /// The exported name: the last path segment of the identity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type tag of the node.
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// The stage the node belongs to.
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// The app the node belongs to.
    pub fn app(&self) -> &str {
        &self.app
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{sep}{}{sep}{}{sep}{}",
            URN_PREFIX,
            self.stage,
            self.app,
            self.type_tag,
            self.name,
            sep = SEPARATOR
        )
    }
}

impl FromStr for Urn {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(URN_PREFIX)
            .ok_or_else(|| NamingError::InvalidUrn(s.to_string()))?;

        let parts: Vec<&str> = rest.split(SEPARATOR).collect();
        if parts.len() != 4 || parts.iter().any(|p| p.is_empty()) {
            return Err(NamingError::InvalidUrn(s.to_string()));
        }

        Ok(Self::new(parts[0], parts[1], parts[2], parts[3]))
    }
}

impl Serialize for Urn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Urn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Urn::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Identifier of a single synthesis run.
///
/// Only used to correlate log lines; it never takes part in naming, so
/// physical names stay deterministic across runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
