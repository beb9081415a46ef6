//! Error types for the Tessera component framework.
//!
//! Errors are organized by subsystem, with each subsystem having its own
//! error type. The root error type, `Error`, can wrap any of them, allowing
//! for uniform error handling at the top level.
//!
//! Structural errors (an unprefixed child name, a provider type without a
//! naming policy, a duplicate exported name) are programming errors in a
//! component library. They are fatal and abort synthesis, so their messages
//! always name the offending component and resource.

use thiserror::Error;

/// Root error type for Tessera.
#[derive(Debug, Error)]
pub enum Error {
    /// Naming errors
    #[error("Naming error: {0}")]
    Naming(#[from] NamingError),

    /// Component tree errors
    #[error(transparent)]
    Component(#[from] ComponentError),

    /// Link graph errors
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Cross-deployment reference errors
    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    /// Transformation errors
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Errors raised by the naming helpers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NamingError {
    /// The URN string could not be parsed
    #[error("Invalid URN: {0}")]
    InvalidUrn(String),
}

/// Structural errors in the component tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// A child's logical name does not start with its parent's logical name
    #[error(
        "In \"{component}\" component, the logical name of \"{resource}\" ({type_tag}) is not prefixed with parent's name {component}"
    )]
    UnprefixedName {
        /// Logical name of the owning component
        component: String,
        /// Logical name of the offending resource
        resource: String,
        /// Type tag of the offending resource
        type_tag: String,
    },

    /// A provider resource type has no physical-naming policy
    #[error(
        "In \"{component}\" component, the physical name of \"{resource}\" ({type_tag}) is not prefixed"
    )]
    MissingNamingPolicy {
        /// Logical name of the owning component
        component: String,
        /// Logical name of the offending resource
        resource: String,
        /// Type tag of the offending resource
        type_tag: String,
    },

    /// A resource referenced a parent that is not part of the graph
    #[error("Parent {parent} of \"{resource}\" was not found")]
    ParentNotFound {
        /// URN of the missing parent
        parent: String,
        /// Logical name of the resource being registered
        resource: String,
    },

    /// A resource with the same URN was already registered
    #[error("Duplicate resource URN: {0}")]
    DuplicateUrn(String),

    /// Version upgrade or downgrade rejected
    #[error("{0}")]
    Version(String),
}

/// Errors raised while building the link graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Two top-level linkables share the same (case-insensitive) name
    #[error("Another resource with the name \"{0}\" already exists")]
    DuplicateName(String),

    /// The name is reserved for the app-level entry
    #[error("Component name \"{0}\" is reserved. Please choose a different name for your component.")]
    ReservedName(String),

    /// A node without a link definition was used as a link
    #[error("\"{0}\" is not linkable")]
    NotLinkable(String),

    /// The link definition of a node could not be produced
    #[error("Failed to read the link definition of \"{name}\": {reason}")]
    DefinitionFailed {
        /// Exported name of the node
        name: String,
        /// Description of the underlying failure
        reason: String,
    },
}

/// Errors related to published cross-deployment references.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// No record with the given exported name
    #[error("No reference named \"{0}\" was published")]
    NotFound(String),

    /// The reference payload could not be parsed
    #[error("Malformed reference record: {0}")]
    Malformed(String),
}

/// Errors raised by user-authored transforms and hooks.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A mutator callback returned an error
    #[error("Transform for \"{name}\" failed: {source}")]
    Callback {
        /// Logical name of the resource being transformed
        name: String,
        /// The callback's error
        #[source]
        source: anyhow::Error,
    },

    /// An interception hook returned an error
    #[error("Interception hook for \"{name}\" ({type_tag}) failed: {source}")]
    Hook {
        /// Logical name of the resource being intercepted
        name: String,
        /// Type tag of the resource being intercepted
        type_tag: String,
        /// The hook's error
        #[source]
        source: anyhow::Error,
    },
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    /// The configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// The configuration is semantically invalid
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type used throughout Tessera.
pub type Result<T> = std::result::Result<T, Error>;
